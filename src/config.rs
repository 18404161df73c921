use std::time::Duration;

/// Settings for the funnel service, read once at startup. Everything has a
/// working default so local development needs no .env file; the payment key
/// is the one genuinely required variable and is checked in `validate_env`.
#[derive(Clone, Debug)]
pub struct FunnelConfig {
    pub preview_api_url: String,
    pub actions_api_url: String,
    pub payment_api_url: String,
    pub payment_api_key: String,
    pub whatsapp_phone: String,
    pub order_contact_phone: String,
    pub frontend_url: String,
    pub preview_timeout: Duration,
}

impl FunnelConfig {
    pub fn from_env() -> Self {
        Self {
            preview_api_url: std::env::var("PREVIEW_API_URL")
                .unwrap_or_else(|_| "https://webdevs.applytocollege.pk".to_string()),
            actions_api_url: std::env::var("ACTIONS_API_URL")
                .unwrap_or_else(|_| "https://webdevs.applytocollege.pk".to_string()),
            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api-v2.ziina.com/api".to_string()),
            payment_api_key: std::env::var("ZIINA_API_KEY").unwrap_or_default(),
            whatsapp_phone: std::env::var("WHATSAPP_PHONE")
                .unwrap_or_else(|_| "+971585775935".to_string()),
            order_contact_phone: std::env::var("ORDER_CONTACT_PHONE")
                .unwrap_or_else(|_| "923461115757".to_string()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            preview_timeout: Duration::from_secs(10),
        }
    }
}

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use rand::Rng;
use serde_json::{json, Value};

use crate::utils::{actions, whatsapp};
use crate::AppState;

const PACKAGE_PRICE_MINOR_UNITS: u32 = 1500; // $15.00
const PAYMENT_TIMEOUT: Duration = Duration::from_secs(15);

/// Initiates the hosted-checkout handoff. Always answers 200 with a
/// `redirect_url`: the gateway's URL on success, the failed route otherwise,
/// so the visitor is never left stuck mid-flow.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    actions::track(
        &state.http_client,
        &state.config.actions_api_url,
        "payment_initiated",
        json!({}),
    );

    match create_payment_intent(&state.http_client, &state.config.payment_api_url,
        &state.config.payment_api_key, &state.config.frontend_url).await
    {
        Ok(Some(redirect_url)) => Ok(Json(json!({
            "status": "redirect",
            "redirect_url": redirect_url,
        }))),
        Ok(None) => {
            tracing::warn!("payment gateway answered without a redirect_url");
            Ok(Json(failed_redirect(&state.config.frontend_url)))
        }
        Err(e) => {
            tracing::error!("payment initiation failed: {}", e);
            Ok(Json(failed_redirect(&state.config.frontend_url)))
        }
    }
}

/// Calls the gateway's payment_intent endpoint for the flat-fee package.
/// Returns the hosted checkout URL when the gateway provides one.
pub async fn create_payment_intent(
    client: &reqwest::Client,
    api_url: &str,
    api_key: &str,
    frontend_url: &str,
) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
    let response = client
        .post(format!("{}/payment_intent", api_url))
        .timeout(PAYMENT_TIMEOUT)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&json!({
            "amount": PACKAGE_PRICE_MINOR_UNITS,
            "currency_code": "USD",
            "message": "Professional Website Package",
            "success_url": format!("{}/payment/success", frontend_url),
            "cancel_url": format!("{}/", frontend_url),
            "failure_url": format!("{}/payment/failed", frontend_url),
            "transaction_source": "directApi",
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(format!("payment gateway returned HTTP {}", response.status()).into());
    }

    let body: Value = response.json().await?;
    Ok(body["redirect_url"]
        .as_str()
        .filter(|url| !url.trim().is_empty())
        .map(|url| url.to_string()))
}

fn failed_redirect(frontend_url: &str) -> Value {
    json!({
        "status": "failed",
        "redirect_url": format!("{}/payment/failed", frontend_url),
    })
}

/// Success landing payload: a fresh order number and the prefilled WhatsApp
/// contact link for kicking off the project.
pub async fn payment_success(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let order_number = generate_order_number();
    let contact_url =
        whatsapp::order_contact_link(&state.config.order_contact_phone, &order_number);

    actions::track(
        &state.http_client,
        &state.config.actions_api_url,
        "payment_succeeded",
        json!({ "order_number": order_number }),
    );

    Ok(Json(json!({
        "title": "Payment Successful!",
        "order_number": order_number,
        "whatsapp_url": contact_url,
    })))
}

/// Failure landing payload. The retry action points back at checkout.
pub async fn payment_failed(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    actions::track(
        &state.http_client,
        &state.config.actions_api_url,
        "payment_failed",
        json!({}),
    );

    Ok(Json(json!({
        "title": "Payment Failed",
        "message": "Something went wrong with your payment.",
        "retry_url": "/api/payment/checkout",
    })))
}

/// Router fallback for routes the funnel doesn't serve.
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Page not found" })),
    )
}

fn generate_order_number() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::Router;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn order_numbers_are_short_and_uppercase() {
        let order = generate_order_number();
        assert_eq!(order.len(), 6);
        assert!(order
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn gateway_redirect_url_is_passed_through() {
        let base = spawn_stub(Router::new().route(
            "/payment_intent",
            post(|| async {
                Json(serde_json::json!({
                    "redirect_url": "https://pay.example.com/session/abc"
                }))
            }),
        ))
        .await;

        let redirect = create_payment_intent(
            &reqwest::Client::new(),
            &base,
            "test-key",
            "http://localhost:8080",
        )
        .await
        .unwrap();
        assert_eq!(
            redirect.as_deref(),
            Some("https://pay.example.com/session/abc")
        );
    }

    #[tokio::test]
    async fn missing_redirect_url_is_a_failure_outcome() {
        // Scenario E: the gateway answers 200 but without a redirect_url.
        let base = spawn_stub(Router::new().route(
            "/payment_intent",
            post(|| async { Json(serde_json::json!({ "id": "pi_123" })) }),
        ))
        .await;

        let redirect = create_payment_intent(
            &reqwest::Client::new(),
            &base,
            "test-key",
            "http://localhost:8080",
        )
        .await
        .unwrap();
        assert!(redirect.is_none());
    }

    #[tokio::test]
    async fn checkout_routes_to_failed_view_when_gateway_gives_no_redirect() {
        let base = spawn_stub(Router::new().route(
            "/payment_intent",
            post(|| async { Json(serde_json::json!({ "id": "pi_123" })) }),
        ))
        .await;
        let state = Arc::new(AppState::new(crate::config::FunnelConfig {
            preview_api_url: "http://127.0.0.1:9".to_string(),
            actions_api_url: "http://127.0.0.1:9".to_string(),
            payment_api_url: base,
            payment_api_key: "test-key".to_string(),
            whatsapp_phone: "+971585775935".to_string(),
            order_contact_phone: "923461115757".to_string(),
            frontend_url: "http://localhost:8080".to_string(),
            preview_timeout: Duration::from_millis(200),
        }));

        let response = create_checkout(State(state)).await.unwrap();
        assert_eq!(response.0["status"], "failed");
        assert_eq!(
            response.0["redirect_url"],
            "http://localhost:8080/payment/failed"
        );
    }

    #[tokio::test]
    async fn unreachable_gateway_is_an_error_not_a_hang() {
        let result = create_payment_intent(
            &reqwest::Client::new(),
            "http://127.0.0.1:9",
            "test-key",
            "http://localhost:8080",
        )
        .await;
        assert!(result.is_err());
    }
}

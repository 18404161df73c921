use dotenvy::dotenv;
use axum::{
    routing::{get, post, delete},
    Router,
};
use tokio::sync::Mutex;
use std::collections::HashMap;
use dashmap::DashMap;
use tower_http::cors::{CorsLayer, AllowOrigin};
use tower_http::trace::{TraceLayer, DefaultMakeSpan, DefaultOnResponse};
use tracing::Level;
use std::sync::Arc;
use uuid::Uuid;
mod handlers {
    pub mod funnel_handlers;
    pub mod payment_handlers;
}
mod utils {
    pub mod actions;
    pub mod preview;
    pub mod whatsapp;
}
mod chat {
    pub mod engine;
    pub mod script;
    pub mod session;
}
mod models {
    pub mod funnel_models;
}
mod config;
use chat::session::ChatSession;
use config::FunnelConfig;
use handlers::{funnel_handlers, payment_handlers};

async fn health_check() -> &'static str {
    "OK"
}

pub struct AppState {
    config: FunnelConfig,
    http_client: reqwest::Client,
    sessions: DashMap<Uuid, Arc<ChatSession>>,
    script_tasks: Mutex<HashMap<Uuid, tokio::task::JoinHandle<()>>>,
}

impl AppState {
    pub fn new(config: FunnelConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            sessions: DashMap::new(),
            script_tasks: Mutex::new(HashMap::new()),
        }
    }
}

pub fn validate_env() {
    let required_vars = ["ZIINA_API_KEY"];
    for var in required_vars.iter() {
        std::env::var(var).expect(&format!("{} must be set", var));
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,webfunnel=debug"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let state = Arc::new(AppState::new(FunnelConfig::from_env()));

    // Public routes; the funnel has no accounts, a session id is the capability
    let funnel_routes = Router::new()
        .route("/api/funnel/start", post(funnel_handlers::start_funnel))
        .route("/api/funnel/{session_id}", get(funnel_handlers::get_transcript))
        .route("/api/funnel/{session_id}/message", post(funnel_handlers::send_message))
        .route("/api/funnel/{session_id}/preview-link", get(funnel_handlers::get_preview_link))
        .route("/api/funnel/{session_id}", delete(funnel_handlers::end_funnel));
    let payment_routes = Router::new()
        .route("/api/payment/checkout", post(payment_handlers::create_checkout))
        .route("/api/payment/success", get(payment_handlers::payment_success))
        .route("/api/payment/failed", get(payment_handlers::payment_failed));

    let app = Router::new()
        .route("/api/health", get(health_check))
        .merge(funnel_routes)
        .merge(payment_routes)
        .fallback(payment_handlers::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
        )
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST, axum::http::Method::OPTIONS, axum::http::Method::DELETE])
                .allow_origin(AllowOrigin::exact(state.config.frontend_url.parse().expect("Invalid FRONTEND_URL")))
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                    axum::http::header::ORIGIN,
                ])
        )
        .with_state(state);

    use tokio::net::TcpListener;
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    validate_env();
    tracing::info!("Starting server on port {}", port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await.unwrap();
    axum::serve(listener, app.into_make_service()).await.unwrap();
}

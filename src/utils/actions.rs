use std::time::Duration;

use serde_json::{json, Value};

/// Mirrors a user gesture to the analytics endpoint. Detached on purpose:
/// the call is issued from its own task, the response is ignored and any
/// failure is swallowed right here, so funnel steps never wait on telemetry.
pub fn track(client: &reqwest::Client, base_url: &str, action_type: &str, action_data: Value) {
    let client = client.clone();
    let url = format!("{}/handle_action", base_url);
    let body = json!({
        "action_type": action_type,
        "action_data": action_data,
    });
    let action_type = action_type.to_string();
    tokio::spawn(async move {
        let result = client
            .post(&url)
            .timeout(Duration::from_secs(5))
            .json(&body)
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!("action beacon '{}' dropped: {}", action_type, e);
        }
    });
}

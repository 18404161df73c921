use std::error::Error;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::models::funnel_models::{FormData, PreviewResult};

/// Shown when neither the API nor the fallback table has anything better.
pub const PLACEHOLDER_PREVIEW_URL: &str = "https://www.wix.com/website/templates";

/// Why the remote recommendation could not be used. Every variant resolves
/// to the local fallback; none of them surfaces to the visitor as an error.
#[derive(Error, Debug)]
pub enum PreviewFailure {
    #[error("no matching theme found")]
    NoMatch,
    #[error("recommendation API returned HTTP {0}")]
    Api(u16),
    #[error("recommendation API body did not match the expected shape")]
    MalformedBody,
    #[error("recommendation API timed out")]
    Timeout,
    #[error("could not reach the recommendation API: {0}")]
    Transport(String),
}

/// What a well-formed recommendation body must contain. Anything missing or
/// empty is a schema mismatch and takes the fallback path; the result is
/// never a partially-populated struct.
#[derive(Deserialize)]
struct RemotePreview {
    search_query: String,
    reasoning: String,
    preview_url: String,
    served_url: Option<String>,
}

/// Resolves the one preview recommendation for a conversation. Network and
/// API problems of every kind come back as `Ok` with a locally synthesized
/// result; an `Err` here means something genuinely unexpected, and the
/// caller converts even that into the fallback.
pub async fn get_theme_preview(
    client: &reqwest::Client,
    base_url: &str,
    timeout: Duration,
    form: &FormData,
) -> Result<PreviewResult, Box<dyn Error + Send + Sync>> {
    let description = build_description(form);

    let outcome = fetch_remote(client, base_url, timeout, &description).await;
    match outcome {
        Ok((remote, raw)) => {
            tracing::info!("theme preview resolved remotely: {}", remote.search_query);
            Ok(PreviewResult {
                search_query: remote.search_query,
                reasoning: remote.reasoning,
                preview_url: remote.preview_url,
                served_url: remote.served_url,
                plain_description: description,
                raw_response: Some(raw),
            })
        }
        Err(failure) => {
            tracing::warn!("theme preview falling back locally: {}", failure);
            Ok(fallback_preview(form, &failure))
        }
    }
}

async fn fetch_remote(
    client: &reqwest::Client,
    base_url: &str,
    timeout: Duration,
    description: &str,
) -> Result<(RemotePreview, String), PreviewFailure> {
    let response = client
        .post(format!("{}/get_theme_preview", base_url))
        .timeout(timeout)
        .json(&json!({ "description": description }))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                PreviewFailure::Timeout
            } else {
                PreviewFailure::Transport(e.to_string())
            }
        })?;

    let status = response.status();
    if status.as_u16() == 404 {
        // The API answering "nothing similar" is a valid outcome, not an error.
        return Err(PreviewFailure::NoMatch);
    }
    if !status.is_success() {
        return Err(PreviewFailure::Api(status.as_u16()));
    }

    let raw = response
        .text()
        .await
        .map_err(|e| PreviewFailure::Transport(e.to_string()))?;
    let remote: RemotePreview =
        serde_json::from_str(&raw).map_err(|_| PreviewFailure::MalformedBody)?;
    if remote.preview_url.trim().is_empty() || remote.search_query.trim().is_empty() {
        return Err(PreviewFailure::MalformedBody);
    }
    Ok((remote, raw))
}

/// Turns the wizard answers into the plain-English brief the recommendation
/// endpoint expects. Empty fields are omitted entirely.
pub fn build_description(form: &FormData) -> String {
    if form.is_empty() {
        return "No website requirements provided.".to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    let name = form.website_name.trim();
    parts.push(format!(
        "I want to create a website called \"{}\".",
        if name.is_empty() { "Untitled" } else { name }
    ));
    if !form.website_description.trim().is_empty() {
        parts.push(format!(
            "The website is about {}.",
            form.website_description.trim()
        ));
    }
    if !form.category.trim().is_empty() {
        parts.push(format!(
            "It falls under the {} category.",
            form.category.trim()
        ));
    }
    if !form.goal.trim().is_empty() {
        parts.push(format!("The main goal is to {}.", form.goal.trim()));
    }
    if !form.traffic.trim().is_empty() {
        parts.push(format!("We are expecting {} visitors.", form.traffic.trim()));
    }
    parts.join(" ")
}

/// Deterministic local recommendation derived from `(category, goal,
/// website_name)`. Category wins over goal, goal wins over the generic
/// placeholder, so repeated calls with the same answers always show the
/// same example site.
pub fn fallback_preview(form: &FormData, failure: &PreviewFailure) -> PreviewResult {
    let category = form.category.trim();
    let goal = form.goal.trim();
    let name = form.website_name.trim();

    let preview_url = category_example_url(category)
        .or_else(|| goal_example_url(goal))
        .unwrap_or(PLACEHOLDER_PREVIEW_URL);

    let search_query = match (category.is_empty(), name.is_empty()) {
        (false, false) => format!("{} website like {}", category, name),
        (false, true) => format!("{} website", category),
        (true, false) => format!("website like {}", name),
        (true, true) => "modern business website".to_string(),
    };

    let reasoning = match failure {
        PreviewFailure::NoMatch => {
            "We didn't find an exact match in our archive, so I picked a proven example that fits your brief perfectly.".to_string()
        }
        PreviewFailure::Timeout => {
            "Instead of waiting for our service, here's a hand-picked example that matches what you described.".to_string()
        }
        _ => {
            "Based on what you told me, this example is the closest match to your requirements.".to_string()
        }
    };

    PreviewResult {
        search_query,
        reasoning,
        preview_url: preview_url.to_string(),
        served_url: None,
        plain_description: build_description(form),
        raw_response: None,
    }
}

fn category_example_url(category: &str) -> Option<&'static str> {
    if category.eq_ignore_ascii_case("ecommerce") {
        Some("https://shopify.com/examples")
    } else if category.eq_ignore_ascii_case("portfolio") {
        Some("https://www.awwwards.com/websites/portfolio/")
    } else if category.eq_ignore_ascii_case("blogs") {
        Some("https://wordpress.com/discover")
    } else if category.eq_ignore_ascii_case("events") {
        Some("https://www.eventbrite.com")
    } else {
        None
    }
}

fn goal_example_url(goal: &str) -> Option<&'static str> {
    let goal = goal.to_lowercase();
    if goal.contains("passive income") {
        Some("https://shopify.com/examples")
    } else if goal.contains("inform") {
        Some("https://wordpress.com/discover")
    } else if goal.contains("community") {
        Some("https://www.discourse.org/customers")
    } else if goal.contains("leads") {
        Some("https://www.hubspot.com/website-examples")
    } else {
        None
    }
}

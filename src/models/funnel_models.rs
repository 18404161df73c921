use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w \-]").unwrap());

/// The record collected across the wizard steps. All fields are optional;
/// blank strings and missing fields are treated the same everywhere.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct FormData {
    #[serde(default)]
    pub website_name: String,
    #[serde(default)]
    pub website_description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub traffic: String,
}

impl FormData {
    /// Strips newlines and anything outside word chars, spaces and hyphens
    /// from every field before the data is used anywhere.
    pub fn sanitized(&self) -> FormData {
        FormData {
            website_name: sanitize_field(&self.website_name),
            website_description: sanitize_field(&self.website_description),
            category: sanitize_field(&self.category),
            goal: sanitize_field(&self.goal),
            traffic: sanitize_field(&self.traffic),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.website_name.trim().is_empty()
            && self.website_description.trim().is_empty()
            && self.category.trim().is_empty()
            && self.goal.trim().is_empty()
            && self.traffic.trim().is_empty()
    }
}

fn sanitize_field(value: &str) -> String {
    let no_newlines = NEWLINES.replace_all(value, " ");
    DISALLOWED.replace_all(&no_newlines, "").trim().to_string()
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Developer,
    User,
}

/// One transcript entry. Created only by the session's append; immutable
/// once created, ordering is append order.
#[derive(Serialize, Clone, Debug)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender: Sender,
    pub is_link: bool,
}

/// What the preview step resolved to, whether it came from the remote
/// recommendation endpoint or from the local fallback table.
#[derive(Serialize, Clone, Debug)]
pub struct PreviewResult {
    pub search_query: String,
    pub reasoning: String,
    pub preview_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_url: Option<String>,
    pub plain_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl PreviewResult {
    /// The URL the "view your website" affordance opens. Never empty: prefers
    /// `served_url`, then `preview_url`, then the canned placeholder.
    pub fn openable_url(&self) -> String {
        if let Some(served) = self.served_url.as_deref() {
            if !served.trim().is_empty() {
                return served.to_string();
            }
        }
        if !self.preview_url.trim().is_empty() {
            return self.preview_url.clone();
        }
        crate::utils::preview::PLACEHOLDER_PREVIEW_URL.to_string()
    }
}

/// Conversation lifecycle. Transitions only move forward; once input is
/// unlocked there is no way back.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConversationState {
    Idle = 0,
    PlayingScript = 1,
    AwaitingPreview = 2,
    ReadyForInput = 3,
}

impl ConversationState {
    pub fn from_u8(value: u8) -> ConversationState {
        match value {
            0 => ConversationState::Idle,
            1 => ConversationState::PlayingScript,
            2 => ConversationState::AwaitingPreview,
            _ => ConversationState::ReadyForInput,
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct StartFunnelRequest {
    pub form_data: FormData,
}

#[derive(Deserialize, Clone)]
pub struct SendMessageRequest {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_newlines_and_symbols() {
        let form = FormData {
            website_name: "cool.shop\n<script>".to_string(),
            website_description: "hand-made rugs & mats".to_string(),
            category: "Ecommerce".to_string(),
            goal: "Make passive income!".to_string(),
            traffic: "Just starting out".to_string(),
        };
        let clean = form.sanitized();
        assert_eq!(clean.website_name, "coolshop script");
        assert_eq!(clean.website_description, "hand-made rugs  mats");
        assert_eq!(clean.goal, "Make passive income");
    }

    #[test]
    fn whitespace_only_form_counts_as_empty() {
        let form = FormData {
            website_name: "   ".to_string(),
            ..Default::default()
        };
        assert!(form.is_empty());
        assert!(!FormData {
            category: "Blogs".to_string(),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn openable_url_never_dead_ends() {
        let mut preview = PreviewResult {
            search_query: "q".to_string(),
            reasoning: "r".to_string(),
            preview_url: "https://example.com".to_string(),
            served_url: None,
            plain_description: "d".to_string(),
            raw_response: None,
        };
        assert_eq!(preview.openable_url(), "https://example.com");

        preview.served_url = Some("https://served.example.com".to_string());
        assert_eq!(preview.openable_url(), "https://served.example.com");

        preview.served_url = Some("  ".to_string());
        preview.preview_url = String::new();
        assert_eq!(
            preview.openable_url(),
            crate::utils::preview::PLACEHOLDER_PREVIEW_URL
        );
    }

    #[test]
    fn state_ordering_is_forward() {
        assert!(ConversationState::Idle < ConversationState::PlayingScript);
        assert!(ConversationState::AwaitingPreview < ConversationState::ReadyForInput);
        assert_eq!(
            ConversationState::from_u8(2),
            ConversationState::AwaitingPreview
        );
    }
}

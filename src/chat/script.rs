use std::time::Duration;

use crate::models::funnel_models::FormData;

// The developer lines, in playback order. The wording is part of the product.
pub const OPENING_LINE: &str = "Assalamualaikum, I'm on the project.";
pub const CREDENTIALS_LINE: &str = "We've made over thousands of websites!";
pub const CUSTOMIZING_LINE: &str = "Wait, I just checked\u{2014}we've made a similar website for a brand in Australia. Please give me 10 seconds to customize it for you.";

/// Dwell times between scripted messages. These are minimum dwell times, not
/// deadlines: the driver awaits each one before the next step starts.
#[derive(Clone, Copy, Debug)]
pub struct ScriptTiming {
    pub summary_delay: Duration,
    pub developer_delay: Duration,
}

impl Default for ScriptTiming {
    fn default() -> Self {
        Self {
            summary_delay: Duration::from_millis(1000),
            developer_delay: Duration::from_millis(2000),
        }
    }
}

impl ScriptTiming {
    /// Zeroed timings so tests play the whole script without waiting.
    pub fn instant() -> Self {
        Self {
            summary_delay: Duration::ZERO,
            developer_delay: Duration::ZERO,
        }
    }
}

/// Renders the "Here are my website requirements" summary the visitor's
/// wizard answers turn into. Blank fields show as "Not specified", never as
/// an empty slot.
pub fn requirements_summary(form: &FormData) -> String {
    format!(
        "Here are my website requirements\nDomain: {}\nCategory: {}\nGoal: {}\nExpected Traffic: {}",
        field_or_not_specified(&form.website_name),
        field_or_not_specified(&form.category),
        field_or_not_specified(&form.goal),
        field_or_not_specified(&form.traffic),
    )
}

/// The final scripted message, marked as a link in the transcript.
pub fn preview_link_message(search_query: &str) -> String {
    format!("View your example website: {}", search_query)
}

fn field_or_not_specified(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "Not specified"
    } else {
        trimmed
    }
}

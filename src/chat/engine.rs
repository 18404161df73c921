use std::error::Error;
use std::sync::Arc;

use serde_json::json;
use tokio::time::Duration;

use crate::chat::script::{self, ScriptTiming};
use crate::chat::session::ChatSession;
use crate::models::funnel_models::{ConversationState, Message, Sender};
use crate::utils::{actions, preview, whatsapp};
use crate::AppState;

/// Plays the scripted conversation for one session, start to finish. Runs as
/// its own task; every step is awaited before the next, so the transcript
/// order always matches the script order. Whatever happens inside, the
/// typing indicator is cleared and input is unlocked on the way out.
pub async fn run_script(state: Arc<AppState>, session: Arc<ChatSession>, timing: ScriptTiming) {
    session.advance(ConversationState::PlayingScript);
    if let Err(e) = play_script(&state, &session, timing).await {
        tracing::error!("script step failed for session {}: {}", session.id, e);
    }
    session.set_typing(false);
    session.advance(ConversationState::ReadyForInput);
    actions::track(
        &state.http_client,
        &state.config.actions_api_url,
        "script_completed",
        json!({ "session_id": session.id }),
    );
}

async fn play_script(
    state: &Arc<AppState>,
    session: &Arc<ChatSession>,
    timing: ScriptTiming,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let form = &session.form_data;

    if form.is_empty() {
        tracing::info!(
            "session {}: form data empty, skipping the requirements summary",
            session.id
        );
    } else {
        session
            .append_message(
                &script::requirements_summary(form),
                Sender::User,
                timing.summary_delay,
                false,
            )
            .await;
    }

    session.set_typing(true);
    session
        .append_message(
            script::OPENING_LINE,
            Sender::Developer,
            timing.developer_delay,
            false,
        )
        .await;
    session
        .append_message(
            script::CREDENTIALS_LINE,
            Sender::Developer,
            timing.developer_delay,
            false,
        )
        .await;
    session.set_typing(false);

    session.set_typing(true);
    session
        .append_message(
            script::CUSTOMIZING_LINE,
            Sender::Developer,
            timing.developer_delay,
            false,
        )
        .await;
    session.set_typing(false);

    session.advance(ConversationState::AwaitingPreview);
    let preview = preview::get_theme_preview(
        &state.http_client,
        &state.config.preview_api_url,
        state.config.preview_timeout,
        form,
    )
    .await
    .unwrap_or_else(|e| {
        tracing::error!("preview resolver failed unexpectedly: {}", e);
        preview::fallback_preview(form, &preview::PreviewFailure::Transport(e.to_string()))
    });

    if !preview.plain_description.trim().is_empty() {
        session
            .append_message(
                &preview.plain_description,
                Sender::Developer,
                Duration::ZERO,
                false,
            )
            .await;
    }
    session
        .append_message(
            &script::preview_link_message(&preview.search_query),
            Sender::Developer,
            Duration::ZERO,
            true,
        )
        .await;
    session.set_preview(preview).await;
    Ok(())
}

/// Handles a free-text send after the script has unlocked input. The text is
/// not interpreted and no scripted reply follows; it is appended to the
/// transcript and forwarded to WhatsApp as a deep link for the client to
/// open. Returns `None` (a no-op) while input is locked or the text is
/// blank.
pub async fn send_user_text(
    state: &Arc<AppState>,
    session: &Arc<ChatSession>,
    text: &str,
) -> Option<(Message, String)> {
    if !session.can_type() {
        tracing::debug!("session {}: send before unlock ignored", session.id);
        return None;
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let message = session
        .append_message(trimmed, Sender::User, Duration::ZERO, false)
        .await;
    let link = whatsapp::chat_link(&state.config.whatsapp_phone, trimmed);
    actions::track(
        &state.http_client,
        &state.config.actions_api_url,
        "chat_message_sent",
        json!({ "session_id": session.id, "text": trimmed }),
    );
    Some((message, link))
}

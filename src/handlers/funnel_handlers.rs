use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::chat::engine;
use crate::chat::script::ScriptTiming;
use crate::chat::session::ChatSession;
use crate::models::funnel_models::{SendMessageRequest, StartFunnelRequest};
use crate::utils::actions;
use crate::AppState;

/// Creates a new chat session from the wizard's answers and starts the
/// scripted playback as a background task. The task handle is kept so a
/// teardown can cancel pending dwell timers.
pub async fn start_funnel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartFunnelRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let form = body.form_data.sanitized();
    let session = Arc::new(ChatSession::new(form.clone()));
    let session_id = session.id;
    state.sessions.insert(session_id, session.clone());

    actions::track(
        &state.http_client,
        &state.config.actions_api_url,
        "form_submit",
        json!({ "session_id": session_id, "form_data": form }),
    );

    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        engine::run_script(task_state, session, ScriptTiming::default()).await;
    });
    state.script_tasks.lock().await.insert(session_id, handle);

    tracing::info!("started funnel session {}", session_id);
    Ok(Json(json!({ "session_id": session_id })))
}

/// Transcript snapshot plus the flags the chat view renders from.
pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let session = find_session(&state, session_id)?;
    Ok(Json(json!({
        "session_id": session_id,
        "messages": session.transcript_snapshot().await,
        "is_typing": session.is_typing(),
        "state": session.state(),
        "can_type": session.can_type(),
    })))
}

/// Free-text send. Locked input and blank text are no-ops, answered with
/// `sent: false` rather than an error so the client never has to handle a
/// failure mid-chat.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let session = find_session(&state, session_id)?;
    match engine::send_user_text(&state, &session, &body.text).await {
        Some((message, whatsapp_url)) => Ok(Json(json!({
            "sent": true,
            "message": message,
            "whatsapp_url": whatsapp_url,
        }))),
        None => Ok(Json(json!({ "sent": false }))),
    }
}

/// The URL behind the final "view your example website" message. Falls back
/// to the canned placeholder while the preview is still resolving, so the
/// affordance never dead-ends.
pub async fn get_preview_link(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let session = find_session(&state, session_id)?;
    let url = match session.preview().await {
        Some(preview) => preview.openable_url(),
        None => crate::utils::preview::PLACEHOLDER_PREVIEW_URL.to_string(),
    };

    actions::track(
        &state.http_client,
        &state.config.actions_api_url,
        "link_click",
        json!({ "session_id": session_id, "url": url }),
    );
    Ok(Json(json!({ "url": url })))
}

/// Tears the session down. Aborting the driver task cancels any pending
/// dwell timer so nothing mutates the session after it is gone.
pub async fn end_funnel(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some((_, handle)) = state.script_tasks.lock().await.remove_entry(&session_id) {
        handle.abort();
    }
    match state.sessions.remove(&session_id) {
        Some(_) => {
            tracing::info!("ended funnel session {}", session_id);
            Ok(Json(json!({ "ended": true })))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Session not found" })),
        )),
    }
}

fn find_session(
    state: &Arc<AppState>,
    session_id: Uuid,
) -> Result<Arc<ChatSession>, (StatusCode, Json<Value>)> {
    state
        .sessions
        .get(&session_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Session not found" })),
            )
        })
}

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::models::funnel_models::{ConversationState, FormData, Message, PreviewResult, Sender};

/// One visitor's chat. Owns the transcript, the typing flag and the
/// conversation state; the script driver is the only writer until input is
/// unlocked, so no further locking discipline is needed.
pub struct ChatSession {
    pub id: Uuid,
    pub form_data: FormData,
    transcript: Mutex<Vec<Message>>,
    preview: Mutex<Option<PreviewResult>>,
    is_typing: AtomicBool,
    state: AtomicU8,
    next_message_id: AtomicI64,
}

impl ChatSession {
    pub fn new(form_data: FormData) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_data,
            transcript: Mutex::new(Vec::new()),
            preview: Mutex::new(None),
            is_typing: AtomicBool::new(false),
            state: AtomicU8::new(ConversationState::Idle as u8),
            // Timestamp-seeded so ids are unique across restarts of the same
            // session id; strictly increasing from there.
            next_message_id: AtomicI64::new(chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Waits out `delay`, then commits the message to the transcript.
    /// Resolves only after the commit, so sequential awaits on this keep the
    /// visible order identical to call order.
    pub async fn append_message(
        &self,
        text: &str,
        sender: Sender,
        delay: Duration,
        is_link: bool,
    ) -> Message {
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let message = Message {
            id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
            text: text.to_string(),
            sender,
            is_link,
        };
        self.transcript.lock().await.push(message.clone());
        message
    }

    pub async fn transcript_snapshot(&self) -> Vec<Message> {
        self.transcript.lock().await.clone()
    }

    pub fn set_typing(&self, typing: bool) {
        self.is_typing.store(typing, Ordering::SeqCst);
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing.load(Ordering::SeqCst)
    }

    /// Moves the conversation forward. Backward transitions are ignored:
    /// once input is unlocked nothing can lock it again.
    pub fn advance(&self, to: ConversationState) {
        self.state.fetch_max(to as u8, Ordering::SeqCst);
    }

    pub fn state(&self) -> ConversationState {
        ConversationState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn can_type(&self) -> bool {
        self.state() == ConversationState::ReadyForInput
    }

    pub async fn set_preview(&self, preview: PreviewResult) {
        *self.preview.lock().await = Some(preview);
    }

    pub async fn preview(&self) -> Option<PreviewResult> {
        self.preview.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transcript_is_append_only_and_ordered() {
        let session = ChatSession::new(FormData::default());
        let first = session
            .append_message("one", Sender::User, Duration::ZERO, false)
            .await;
        let second = session
            .append_message("two", Sender::Developer, Duration::ZERO, false)
            .await;
        assert!(second.id > first.id);

        let transcript = session.transcript_snapshot().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].text, "one");
        assert_eq!(transcript[1].text, "two");
    }

    #[tokio::test]
    async fn state_never_moves_backward() {
        let session = ChatSession::new(FormData::default());
        assert_eq!(session.state(), ConversationState::Idle);
        assert!(!session.can_type());

        session.advance(ConversationState::ReadyForInput);
        session.advance(ConversationState::PlayingScript);
        assert_eq!(session.state(), ConversationState::ReadyForInput);
        assert!(session.can_type());
    }

    #[tokio::test]
    async fn append_waits_out_the_dwell_time() {
        let session = ChatSession::new(FormData::default());
        let started = tokio::time::Instant::now();
        session
            .append_message("slow", Sender::Developer, Duration::from_millis(50), false)
            .await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}

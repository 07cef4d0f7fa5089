use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nomorejokes_core::flows::{
    FlowAction, FlowEngine, FlowReply, SessionEvent, SessionKey, SessionState, TransitionOutcome,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::runtime::ArticleGenerator;

#[derive(Debug, Error)]
#[error("reply delivery failed: {0}")]
pub struct ReplyError(pub String);

/// Outbound channel back to the chat the event came from.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply: FlowReply) -> Result<(), ReplyError>;
}

/// Per-session context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub state: SessionState,
}

type SessionSlot = Arc<tokio::sync::Mutex<SessionContext>>;

/// Drives the two-state article conversation for every user.
///
/// Events for one session are handled strictly in order, generation
/// included. Different sessions proceed independently.
pub struct ConversationController<G> {
    engine: FlowEngine,
    generator: Arc<G>,
    sessions: Mutex<HashMap<SessionKey, SessionSlot>>,
}

impl<G: ArticleGenerator> ConversationController<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { engine: FlowEngine::new(), generator, sessions: Mutex::new(HashMap::new()) }
    }

    pub async fn session_state(&self, key: SessionKey) -> SessionState {
        match self.existing_slot(key) {
            Some(slot) => slot.lock().await.state,
            None => self.engine.initial_state(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|sessions| sessions.len()).unwrap_or_default()
    }

    /// Applies one inbound event. Returns `None` when the event does not
    /// apply to the session's current state; nothing is sent in that case.
    pub async fn handle(
        &self,
        key: SessionKey,
        event: SessionEvent,
        correlation_id: &str,
        sink: &dyn ReplySink,
    ) -> Option<TransitionOutcome> {
        let slot = self.slot(key)?;
        let mut context = slot.lock().await;

        let outcome = match self.engine.apply(context.state, &event) {
            Ok(outcome) => outcome,
            Err(error) => {
                debug!(
                    event_name = "conversation.event.ignored",
                    correlation_id,
                    chat_id = key.chat_id,
                    user_id = key.user_id,
                    error = %error,
                    "event does not apply to current session state"
                );
                return None;
            }
        };

        context.state = outcome.to;
        info!(
            event_name = "conversation.transition",
            correlation_id,
            chat_id = key.chat_id,
            user_id = key.user_id,
            from = ?outcome.from,
            to = ?outcome.to,
            "session transitioned"
        );

        for action in &outcome.actions {
            let reply = match action {
                FlowAction::SendGreeting => FlowReply::Greeting,
                FlowAction::PromptForTopic => FlowReply::TopicRequested,
                FlowAction::PromptForNonEmptyTopic => FlowReply::EmptyTopic,
                FlowAction::AcknowledgeTopic => FlowReply::Generating,
                FlowAction::ConfirmCancellation => FlowReply::Cancelled,
                FlowAction::GenerateArticle(request) => {
                    match self.generator.generate(request, correlation_id).await {
                        Ok(published) => FlowReply::Published(published),
                        Err(error) => error.user_reply(),
                    }
                }
            };
            deliver(sink, reply, key, correlation_id).await;
        }

        Some(outcome)
    }

    fn slot(&self, key: SessionKey) -> Option<SessionSlot> {
        match self.sessions.lock() {
            Ok(mut sessions) => Some(Arc::clone(sessions.entry(key).or_default())),
            Err(_) => {
                warn!(
                    event_name = "conversation.sessions.poisoned",
                    chat_id = key.chat_id,
                    user_id = key.user_id,
                    "session table lock is poisoned"
                );
                None
            }
        }
    }

    fn existing_slot(&self, key: SessionKey) -> Option<SessionSlot> {
        self.sessions.lock().ok().and_then(|sessions| sessions.get(&key).cloned())
    }
}

async fn deliver(sink: &dyn ReplySink, reply: FlowReply, key: SessionKey, correlation_id: &str) {
    if let Err(error) = sink.send(reply).await {
        warn!(
            event_name = "conversation.reply.failed",
            correlation_id,
            chat_id = key.chat_id,
            user_id = key.user_id,
            error = %error,
            "could not deliver reply"
        );
    }
}

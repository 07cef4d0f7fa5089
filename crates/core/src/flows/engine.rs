use thiserror::Error;

use crate::domain::ArticleRequest;
use crate::flows::states::{FlowAction, SessionEvent, SessionState, TransitionOutcome};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: SessionState, event: SessionEvent },
}

/// Two-state article conversation: `Idle` and `AwaitingTopic`.
#[derive(Clone, Debug, Default)]
pub struct FlowEngine;

impl FlowEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn initial_state(&self) -> SessionState {
        SessionState::Idle
    }

    pub fn apply(
        &self,
        current: SessionState,
        event: &SessionEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition(current, event)
    }
}

fn transition(
    current: SessionState,
    event: &SessionEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{
        AcknowledgeTopic, ConfirmCancellation, GenerateArticle, PromptForNonEmptyTopic,
        PromptForTopic, SendGreeting,
    };
    use SessionEvent::{CancelRequested, GenerateRequested, MessageReceived, StartRequested};
    use SessionState::{AwaitingTopic, Idle};

    let (to, actions) = match (current, event) {
        (state, StartRequested) => (state, vec![SendGreeting]),
        (Idle, GenerateRequested) => (AwaitingTopic, vec![PromptForTopic]),
        (AwaitingTopic, MessageReceived { text }) => match ArticleRequest::from_text(text) {
            Some(request) => (Idle, vec![AcknowledgeTopic, GenerateArticle(request)]),
            None => (AwaitingTopic, vec![PromptForNonEmptyTopic]),
        },
        (_, CancelRequested) => (Idle, vec![ConfirmCancellation]),
        (Idle, MessageReceived { .. }) | (AwaitingTopic, GenerateRequested) => {
            return Err(FlowTransitionError::InvalidTransition {
                state: current,
                event: event.clone(),
            })
        }
    };

    Ok(TransitionOutcome { from: current, to, event: event.clone(), actions })
}

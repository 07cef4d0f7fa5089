use serde::{Deserialize, Serialize};

use crate::domain::{ArticleRequest, PublishedArticle};

/// Identifies one user's conversation in one chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub chat_id: i64,
    pub user_id: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingTopic,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    StartRequested,
    GenerateRequested,
    MessageReceived { text: String },
    CancelRequested,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    SendGreeting,
    PromptForTopic,
    PromptForNonEmptyTopic,
    AcknowledgeTopic,
    GenerateArticle(ArticleRequest),
    ConfirmCancellation,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: SessionState,
    pub to: SessionState,
    pub event: SessionEvent,
    pub actions: Vec<FlowAction>,
}

/// Everything the conversation can say back to a user. Transports decide how
/// each reply is worded and formatted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowReply {
    Greeting,
    TopicRequested,
    EmptyTopic,
    Generating,
    Published(PublishedArticle),
    ParseFailure,
    GenerationFailure,
    Cancelled,
}

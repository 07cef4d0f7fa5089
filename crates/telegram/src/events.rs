use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use nomorejokes_core::flows::{SessionEvent, SessionKey};
use thiserror::Error;

use crate::{
    commands::{parse_command, BotCommand},
    types::Update,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateEnvelope {
    pub update_id: i64,
    pub event: ChatEvent,
}

impl UpdateEnvelope {
    /// Classifies a raw update. Messages from bots and updates without text
    /// are unsupported.
    pub fn from_update(update: Update, bot_username: Option<&str>) -> Self {
        let update_id = update.update_id;
        let Some(message) = update.message else {
            return Self { update_id, event: ChatEvent::Unsupported { kind: "non_message".into() } };
        };
        let Some(user) = message.from.filter(|user| !user.is_bot) else {
            return Self { update_id, event: ChatEvent::Unsupported { kind: "no_human_sender".into() } };
        };
        let Some(text) = message.text else {
            return Self { update_id, event: ChatEvent::Unsupported { kind: "non_text".into() } };
        };

        let key = SessionKey { chat_id: message.chat.id, user_id: user.id };
        let event = match parse_command(&text, bot_username) {
            Some(command) => ChatEvent::Command(CommandEvent { key, command }),
            None if text.trim_start().starts_with('/') => {
                ChatEvent::Unsupported { kind: "foreign_command".into() }
            }
            None => ChatEvent::TextMessage(TextMessageEvent { key, text }),
        };

        Self { update_id, event }
    }

    pub fn correlation_id(&self) -> String {
        format!("update-{}", self.update_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    Command(CommandEvent),
    TextMessage(TextMessageEvent),
    Unsupported { kind: String },
}

impl ChatEvent {
    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::Command(_) => ChatEventType::Command,
            Self::TextMessage(_) => ChatEventType::TextMessage,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }

    pub fn session_key(&self) -> Option<SessionKey> {
        match self {
            Self::Command(event) => Some(event.key),
            Self::TextMessage(event) => Some(event.key),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    Command,
    TextMessage,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEvent {
    pub key: SessionKey,
    pub command: BotCommand,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMessageEvent {
    pub key: SessionKey,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("conversation service failure: {0}")]
    Conversation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Receives conversation events already mapped from Telegram updates.
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn handle_event(
        &self,
        key: SessionKey,
        event: SessionEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

pub fn conversation_dispatcher<S>(service: Arc<S>) -> EventDispatcher
where
    S: ConversationService + 'static,
{
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(CommandHandler::new(Arc::clone(&service)));
    dispatcher.register(TextMessageHandler::new(service));
    dispatcher
}

pub struct CommandHandler<S> {
    service: Arc<S>,
}

impl<S> CommandHandler<S>
where
    S: ConversationService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for CommandHandler<S>
where
    S: ConversationService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::Command
    }

    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::Command(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let Some(session_event) = event.command.session_event() else {
            return Ok(HandlerResult::Ignored);
        };

        self.service.handle_event(event.key, session_event, ctx).await
    }
}

pub struct TextMessageHandler<S> {
    service: Arc<S>,
}

impl<S> TextMessageHandler<S>
where
    S: ConversationService,
{
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for TextMessageHandler<S>
where
    S: ConversationService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::TextMessage
    }

    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::TextMessage(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let session_event = SessionEvent::MessageReceived { text: event.text.clone() };
        self.service.handle_event(event.key, session_event, ctx).await
    }
}

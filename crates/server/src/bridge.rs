use std::sync::Arc;

use async_trait::async_trait;
use nomorejokes_agent::conversation::{ConversationController, ReplyError, ReplySink};
use nomorejokes_agent::runtime::ArticleGenerator;
use nomorejokes_core::flows::{FlowReply, SessionEvent, SessionKey};
use nomorejokes_telegram::events::{
    ConversationService, EventContext, EventHandlerError, HandlerResult,
};
use nomorejokes_telegram::messages::render_reply;
use nomorejokes_telegram::polling::ReplyChannel;

/// Routes Telegram conversation events into the controller and renders its
/// replies back to the originating chat.
pub struct ConversationBridge<G> {
    controller: Arc<ConversationController<G>>,
    channel: Arc<dyn ReplyChannel>,
}

impl<G> ConversationBridge<G> {
    pub fn new(controller: Arc<ConversationController<G>>, channel: Arc<dyn ReplyChannel>) -> Self {
        Self { controller, channel }
    }
}

#[async_trait]
impl<G> ConversationService for ConversationBridge<G>
where
    G: ArticleGenerator + 'static,
{
    async fn handle_event(
        &self,
        key: SessionKey,
        event: SessionEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let sink = TelegramReplySink { channel: Arc::clone(&self.channel), chat_id: key.chat_id };
        let outcome = self.controller.handle(key, event, &ctx.correlation_id, &sink).await;
        Ok(match outcome {
            Some(_) => HandlerResult::Processed,
            None => HandlerResult::Ignored,
        })
    }
}

pub struct TelegramReplySink {
    channel: Arc<dyn ReplyChannel>,
    chat_id: i64,
}

#[async_trait]
impl ReplySink for TelegramReplySink {
    async fn send(&self, reply: FlowReply) -> Result<(), ReplyError> {
        let message = render_reply(&reply);
        self.channel
            .send_message(self.chat_id, &message)
            .await
            .map_err(|error| ReplyError(error.to_string()))
    }
}

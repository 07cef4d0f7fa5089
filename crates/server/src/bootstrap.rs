use std::sync::Arc;
use std::time::Duration;

use nomorejokes_agent::{
    conversation::ConversationController,
    gemini::GeminiClient,
    llm::{LlmClient, LlmError},
    runtime::AgentRuntime,
};
use nomorejokes_core::config::AppConfig;
use nomorejokes_core::publish::ArticlePublisher;
use nomorejokes_core::readiness::{check_output_dir, check_template};
use nomorejokes_core::render::TemplateRenderer;
use nomorejokes_telegram::{
    api::BotApiTransport,
    events::conversation_dispatcher,
    polling::{LongPollRunner, ReconnectPolicy, ReplyChannel, TransportError},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::bridge::ConversationBridge;

pub struct Application {
    pub config: AppConfig,
    pub controller: Arc<ConversationController<AgentRuntime>>,
    pub runner: LongPollRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("generation backend client failed: {0}")]
    Llm(#[from] LlmError),
    #[error("telegram transport failed: {0}")]
    Transport(#[from] TransportError),
}

pub fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    for check in [
        check_template(&config.publishing.template_path),
        check_output_dir(&config.publishing.output_dir),
    ] {
        if !check.ready {
            // Not fatal: the failure surfaces per article and in /health.
            warn!(
                event_name = "system.bootstrap.publishing_not_ready",
                correlation_id = "bootstrap",
                detail = %check.detail,
                "publishing target is not ready"
            );
        }
    }

    let llm: Arc<dyn LlmClient> = Arc::new(GeminiClient::from_config(&config.llm)?);
    let publisher = ArticlePublisher::new(
        TemplateRenderer::new(config.publishing.template_path.clone()),
        config.publishing.output_dir.clone(),
        config.publishing.public_base_url.clone(),
    );
    let runtime = AgentRuntime::new(llm, publisher, Duration::from_secs(config.llm.timeout_secs));
    let controller = Arc::new(ConversationController::new(Arc::new(runtime)));
    info!(
        event_name = "system.bootstrap.runtime_ready",
        correlation_id = "bootstrap",
        model = %config.llm.model,
        timeout_secs = config.llm.timeout_secs,
        "article runtime initialized"
    );

    let transport = Arc::new(BotApiTransport::from_config(&config.telegram)?);
    let channel: Arc<dyn ReplyChannel> = transport.clone();
    let bridge = Arc::new(ConversationBridge::new(Arc::clone(&controller), channel));
    let runner =
        LongPollRunner::new(transport, conversation_dispatcher(bridge), ReconnectPolicy::default());

    Ok(Application { config, controller, runner })
}

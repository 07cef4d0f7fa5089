use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use nomorejokes_core::domain::{ArticleRequest, PublishedArticle};
use nomorejokes_core::errors::PipelineError;
use nomorejokes_core::prompt::build_prompt;
use nomorejokes_core::publish::ArticlePublisher;
use nomorejokes_core::response::parse_article_response;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::LlmClient;

/// Produces a published article for a topic.
#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &ArticleRequest,
        correlation_id: &str,
    ) -> Result<PublishedArticle, PipelineError>;
}

pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    publisher: ArticlePublisher,
    timeout: Duration,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, publisher: ArticlePublisher, timeout: Duration) -> Self {
        Self { llm, publisher, timeout }
    }

    pub fn publisher(&self) -> &ArticlePublisher {
        &self.publisher
    }

    async fn run(
        &self,
        request: &ArticleRequest,
        generation_id: &str,
        correlation_id: &str,
    ) -> Result<PublishedArticle, PipelineError> {
        let prompt = build_prompt(request);

        let raw = match tokio::time::timeout(self.timeout, self.llm.complete(&prompt)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(error)) => return Err(PipelineError::Backend(error.to_string())),
            Err(_) => {
                return Err(PipelineError::Backend(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        let record = parse_article_response(&raw)?;
        for advisory in record.advisories() {
            warn!(
                event_name = "article.generation.advisory",
                correlation_id,
                generation_id,
                advisory = %advisory,
                "generated article is outside recommended limits"
            );
        }

        self.publisher.publish(&record, Utc::now())
    }
}

#[async_trait]
impl ArticleGenerator for AgentRuntime {
    async fn generate(
        &self,
        request: &ArticleRequest,
        correlation_id: &str,
    ) -> Result<PublishedArticle, PipelineError> {
        let generation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "article.generation.started",
            correlation_id,
            generation_id = %generation_id,
            topic = %request.topic(),
            "article generation started"
        );

        let result = self.run(request, &generation_id, correlation_id).await;
        match &result {
            Ok(published) => info!(
                event_name = "article.generation.published",
                correlation_id,
                generation_id = %generation_id,
                slug = %published.slug,
                path = %published.saved_path.display(),
                "article published"
            ),
            Err(error) => warn!(
                event_name = "article.generation.failed",
                correlation_id,
                generation_id = %generation_id,
                failure_kind = error.kind().as_str(),
                error = %error,
                "article generation failed"
            ),
        }
        result
    }
}

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
    #[error("API request failed: {0}")]
    ApiRequest(String),
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },
    #[error("API response parse failed: {0}")]
    ApiParse(String),
    #[error("prompt was blocked: {0}")]
    Blocked(String),
    #[error("response contained no text")]
    EmptyResponse,
}

/// A single-shot text completion backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

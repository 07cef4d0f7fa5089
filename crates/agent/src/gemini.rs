//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use nomorejokes_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{LlmClient, LlmError};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Builds a client without a request timeout; callers bound each call
    /// themselves.
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, api_key, base_url, model: model.into() })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(config.api_key.clone(), config.base_url.clone(), config.model.clone())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send_json(&self, body: &impl Serialize) -> Result<String, LlmError> {
        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            contents: vec![RequestContent { role: "user", parts: vec![RequestPart { text: prompt }] }],
        };
        let raw = self.send_json(&body).await?;
        debug!(
            event_name = "llm.gemini.response_received",
            model = %self.model,
            bytes = raw.len(),
            "gemini response received"
        );
        extract_text(&raw)
    }
}

/// Concatenates the text parts of the first candidate.
pub fn extract_text(raw: &str) -> Result<String, LlmError> {
    let response: GenerateResponse =
        serde_json::from_str(raw).map_err(|e| LlmError::ApiParse(e.to_string()))?;

    let candidate = response.candidates.into_iter().next();
    let Some(candidate) = candidate else {
        return match response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            Some(reason) => Err(LlmError::Blocked(reason)),
            None => Err(LlmError::EmptyResponse),
        };
    };

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{extract_text, GeminiClient};
    use crate::llm::{LlmClient, LlmError};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key".to_string().into(), server.uri(), "gemini-1.5-flash")
            .expect("client builds")
    }

    #[tokio::test]
    async fn complete_posts_prompt_and_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "write something" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "{\"title\":" }, { "text": "\"x\"}" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).complete("write something").await.expect("completion");
        assert_eq!(text, "{\"title\":\"x\"}");
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let error = client(&server).complete("prompt").await.expect_err("rate limited");
        assert!(matches!(
            error,
            LlmError::ApiResponse { status: 429, ref body } if body == "quota exceeded"
        ));
    }

    #[test]
    fn blocked_prompt_surfaces_block_reason() {
        let error = extract_text(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .expect_err("blocked");
        assert!(matches!(error, LlmError::Blocked(ref reason) if reason == "SAFETY"));
    }

    #[test]
    fn candidate_without_text_is_empty_response() {
        let error = extract_text(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#)
            .expect_err("no text");
        assert!(matches!(error, LlmError::EmptyResponse));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        assert!(matches!(extract_text("<html>"), Err(LlmError::ApiParse(_))));
    }
}

//! Bot API over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use nomorejokes_core::config::TelegramConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::{
    messages::{MessageTemplate, ParseMode},
    polling::{BotIdentity, ReplyChannel, TransportError, UpdateTransport},
    types::{ApiResponse, Update},
};

const CONNECT_TIMEOUT_SECS: u64 = 10;
// Headroom on top of the long-poll timeout before the HTTP request is abandoned.
const REQUEST_GRACE_SECS: u64 = 15;

pub struct BotApiTransport {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
    poll_timeout_secs: u64,
}

impl BotApiTransport {
    pub fn new(
        token: SecretString,
        base_url: impl Into<String>,
        poll_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(poll_timeout_secs + REQUEST_GRACE_SECS))
            .build()
            .map_err(|e| TransportError::Connect(e.without_url().to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, token, poll_timeout_secs })
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self, TransportError> {
        Self::new(config.bot_token.clone(), config.api_base_url.clone(), config.poll_timeout_secs)
    }

    // The URL embeds the bot token, so request errors are stripped of it.
    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = format!("{}/bot{}/{}", self.base_url, self.token.expose_secret(), method);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Receive(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::Receive(e.without_url().to_string()))?;

        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TransportError::Api {
                method: method.to_string(),
                description: envelope.description.unwrap_or_else(|| format!("http status {status}")),
            }),
        }
    }
}

#[derive(Serialize)]
struct GetUpdatesRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

#[derive(Serialize)]
struct Empty {}

#[derive(Deserialize)]
struct GetMeResult {
    id: i64,
    username: Option<String>,
}

#[async_trait]
impl UpdateTransport for BotApiTransport {
    async fn connect(&self) -> Result<BotIdentity, TransportError> {
        let me: GetMeResult = self.call("getMe", &Empty {}).await.map_err(|error| match error {
            TransportError::Receive(detail) => TransportError::Connect(detail),
            other => other,
        })?;
        Ok(BotIdentity { id: me.id, username: me.username })
    }

    async fn poll(&self, offset: Option<i64>) -> Result<Option<Vec<Update>>, TransportError> {
        let request =
            GetUpdatesRequest { offset, timeout: self.poll_timeout_secs, allowed_updates: &["message"] };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        debug!(count = updates.len(), offset = ?offset, "telegram updates polled");
        Ok(Some(updates))
    }
}

#[async_trait]
impl ReplyChannel for BotApiTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        message: &MessageTemplate,
    ) -> Result<(), TransportError> {
        let request =
            SendMessageRequest { chat_id, text: &message.text, parse_mode: message.parse_mode };
        self.call::<serde_json::Value, _>("sendMessage", &request).await.map_err(|error| match error {
            TransportError::Receive(detail) => TransportError::Send(detail),
            other => other,
        })?;
        Ok(())
    }
}

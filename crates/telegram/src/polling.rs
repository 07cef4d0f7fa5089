use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use nomorejokes_core::flows::SessionKey;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    events::{EventContext, EventDispatcher, UpdateEnvelope},
    messages::MessageTemplate,
    types::Update,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("bot api rejected `{method}`: {description}")]
    Api { method: String, description: String },
}

#[derive(Debug, Error)]
pub enum PollingError {
    #[error("long polling gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: TransportError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 8, base_delay_ms: 500, max_delay_ms: 30_000 }
    }
}

impl ReconnectPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: i64,
    pub username: Option<String>,
}

#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn connect(&self) -> Result<BotIdentity, TransportError>;
    /// Long-polls for updates at or after `offset`. `Ok(None)` means the
    /// update stream has closed.
    async fn poll(&self, offset: Option<i64>) -> Result<Option<Vec<Update>>, TransportError>;
}

#[async_trait]
pub trait ReplyChannel: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        message: &MessageTemplate,
    ) -> Result<(), TransportError>;
}

/// Pulls updates and dispatches them, one ordered lane per session.
///
/// Updates for the same chat user are dispatched strictly in arrival order;
/// different users never wait on each other.
pub struct LongPollRunner {
    transport: Arc<dyn UpdateTransport>,
    dispatcher: Arc<EventDispatcher>,
    reconnect_policy: ReconnectPolicy,
}

impl LongPollRunner {
    pub fn new(
        transport: Arc<dyn UpdateTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher: Arc::new(dispatcher), reconnect_policy }
    }

    pub async fn start(&self) -> Result<(), PollingError> {
        let mut attempt = 0_u32;
        let mut offset: Option<i64> = None;

        loop {
            let mut received = false;
            let result = self.connect_and_pump(attempt, &mut offset, &mut received).await;
            let Err(transport_error) = result else {
                return Ok(());
            };

            if received {
                attempt = 0;
            }
            warn!(
                event_name = "ingress.telegram.transport_failed",
                attempt,
                max_retries = self.reconnect_policy.max_retries,
                error = %transport_error,
                "telegram transport failed"
            );

            if attempt >= self.reconnect_policy.max_retries {
                return Err(PollingError::RetriesExhausted {
                    attempts: attempt + 1,
                    last_error: transport_error,
                });
            }

            let delay = self.reconnect_policy.backoff(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    async fn connect_and_pump(
        &self,
        attempt: u32,
        offset: &mut Option<i64>,
        received: &mut bool,
    ) -> Result<(), TransportError> {
        info!(attempt, "connecting to telegram bot api");
        let identity = self.transport.connect().await?;
        info!(
            event_name = "ingress.telegram.connected",
            attempt,
            bot_id = identity.id,
            bot_username = identity.username.as_deref().unwrap_or("unknown"),
            "telegram bot api connected"
        );

        let mut lanes = SessionLanes::new(Arc::clone(&self.dispatcher), LANE_IDLE_TIMEOUT);
        loop {
            let polled = match self.transport.poll(*offset).await {
                Ok(polled) => polled,
                Err(error) => {
                    lanes.close().await;
                    return Err(error);
                }
            };
            let Some(updates) = polled else {
                info!(attempt, "telegram update stream closed");
                lanes.close().await;
                return Ok(());
            };
            *received = true;

            for update in updates {
                *offset = Some(offset.map_or(update.update_id + 1, |current| {
                    current.max(update.update_id + 1)
                }));

                let envelope = UpdateEnvelope::from_update(update, identity.username.as_deref());
                info!(
                    event_name = "ingress.telegram.update_received",
                    update_id = envelope.update_id,
                    event_type = ?envelope.event.event_type(),
                    correlation_id = %envelope.correlation_id(),
                    "received telegram update"
                );

                match envelope.event.session_key() {
                    Some(key) => lanes.submit(key, envelope),
                    None => debug!(
                        update_id = envelope.update_id,
                        correlation_id = %envelope.correlation_id(),
                        "skipping update without a session"
                    ),
                }
            }
        }
    }
}

/// A session lane with no traffic for this long exits and is pruned.
const LANE_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

struct Lane {
    sender: mpsc::UnboundedSender<UpdateEnvelope>,
    worker: JoinHandle<()>,
}

struct SessionLanes {
    dispatcher: Arc<EventDispatcher>,
    idle_timeout: Duration,
    lanes: HashMap<SessionKey, Lane>,
}

impl SessionLanes {
    fn new(dispatcher: Arc<EventDispatcher>, idle_timeout: Duration) -> Self {
        Self { dispatcher, idle_timeout, lanes: HashMap::new() }
    }

    fn submit(&mut self, key: SessionKey, envelope: UpdateEnvelope) {
        let (envelope, previous) = match self.lanes.remove(&key) {
            Some(lane) => match lane.sender.send(envelope) {
                Ok(()) => {
                    self.lanes.insert(key, lane);
                    return;
                }
                Err(mpsc::error::SendError(envelope)) => (envelope, Some(lane.worker)),
            },
            None => (envelope, None),
        };
        self.prune();

        let (sender, receiver) = mpsc::unbounded_channel();
        // A fresh channel with a live receiver always accepts.
        let _ = sender.send(envelope);
        let dispatcher = Arc::clone(&self.dispatcher);
        let idle_timeout = self.idle_timeout;
        let worker = tokio::spawn(async move {
            // A retiring lane may still be draining; keep the session's order.
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            drain_lane(dispatcher, receiver, idle_timeout).await;
        });
        self.lanes.insert(key, Lane { sender, worker });
    }

    fn prune(&mut self) {
        self.lanes.retain(|_, lane| !lane.worker.is_finished());
    }

    #[cfg(test)]
    fn active(&mut self) -> usize {
        self.prune();
        self.lanes.len()
    }

    async fn close(&mut self) {
        for (_, lane) in self.lanes.drain() {
            drop(lane.sender);
            if let Err(error) = lane.worker.await {
                warn!(error = %error, "session lane worker panicked");
            }
        }
    }
}

async fn drain_lane(
    dispatcher: Arc<EventDispatcher>,
    mut receiver: mpsc::UnboundedReceiver<UpdateEnvelope>,
    idle_timeout: Duration,
) {
    loop {
        let envelope = match tokio::time::timeout(idle_timeout, receiver.recv()).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return,
            Err(_) => {
                // Refuse new sends, then finish whatever already queued.
                receiver.close();
                while let Ok(envelope) = receiver.try_recv() {
                    dispatch_envelope(&dispatcher, &envelope).await;
                }
                return;
            }
        };
        dispatch_envelope(&dispatcher, &envelope).await;
    }
}

async fn dispatch_envelope(dispatcher: &EventDispatcher, envelope: &UpdateEnvelope) {
    let context = EventContext { correlation_id: envelope.correlation_id() };
    if let Err(error) = dispatcher.dispatch(envelope, &context).await {
        warn!(
            update_id = envelope.update_id,
            correlation_id = %context.correlation_id,
            error = %error,
            "event dispatch failed; continuing polling loop"
        );
    }
}

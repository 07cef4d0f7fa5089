//! Telegram Bot API interface
//!
//! - **Long polling** (`polling`) - `getUpdates` loop with offset tracking and reconnection
//! - **Bot API** (`api`) - HTTP transport for `getMe`, `getUpdates` and `sendMessage`
//! - **Commands** (`commands`) - `/start`, `/help`, `/generate`, `/publish`, `/cancel`
//! - **Events** (`events`) - Typed updates routed to conversation handlers
//! - **Messages** (`messages`) - Reply wording and Markdown formatting
//!
//! ```text
//! getUpdates → LongPollRunner → EventDispatcher → ConversationService
//!                                                        ↓
//!                                  sendMessage ← MessageTemplate
//! ```

pub mod api;
pub mod commands;
pub mod events;
pub mod messages;
pub mod polling;
pub mod types;

pub use api::BotApiTransport;
pub use events::{conversation_dispatcher, ConversationService, EventDispatcher};
pub use messages::{render_reply, MessageTemplate};
pub use polling::{LongPollRunner, ReconnectPolicy, ReplyChannel, TransportError, UpdateTransport};

//! Article generation runtime.
//!
//! This crate turns a user's topic into a published article:
//! - `llm` defines the text generation backend seam
//! - `gemini` implements that seam against the Gemini `generateContent` API
//! - `runtime` runs prompt, parse, render and persist for one topic
//! - `conversation` keeps per-user session state and drives the flow engine
//!
//! The model only writes prose. Slug sanitizing, file naming and the public
//! URL are decided here, never by the backend.

pub mod conversation;
pub mod gemini;
pub mod llm;
pub mod runtime;

pub use conversation::{ConversationController, ReplyError, ReplySink, SessionContext};
pub use gemini::GeminiClient;
pub use llm::{LlmClient, LlmError};
pub use runtime::{AgentRuntime, ArticleGenerator};

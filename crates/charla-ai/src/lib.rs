//! Chat engine for Charla.
//!
//! Provides the Groq completion client and conversation management:
//! - Linear transcript with a fixed Spanish system directive
//! - OpenAI-compatible `chat/completions` requests (plain and SSE streaming)
//! - Render-time post-processing (reasoning extraction, math rewriting)
//! - Token usage tracking per model

pub mod groq;
pub mod models;
pub mod postprocess;
pub mod session;
pub mod streaming;
pub mod token_tracker;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use groq::{GroqClient, GroqConfig};
pub use models::Model;
pub use postprocess::{process, Processed};
pub use session::{Session, DEFAULT_SYSTEM_PROMPT};
pub use token_tracker::TokenTracker;

/// Lowest sampling temperature the chat surface offers.
pub const TEMPERATURE_MIN: f64 = 0.0;
/// Highest sampling temperature the chat surface offers.
pub const TEMPERATURE_MAX: f64 = 1.5;

/// A completion backend the session can talk to.
///
/// The transcript is replayed verbatim as role/content pairs on every call;
/// backends must not reorder or filter it.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f64,
    ) -> Result<Completion, CompletionError>;

    /// Streaming variant: `on_chunk` receives content deltas as they arrive.
    /// The returned [`Completion`] carries the full assembled content.
    async fn complete_streaming(
        &self,
        messages: &[Message],
        model: &str,
        temperature: f64,
        on_chunk: Box<dyn Fn(String) + Send + Sync>,
    ) -> Result<Completion, CompletionError>;
}

/// One turn in a transcript. Immutable once appended.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Populated on assistant turns only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, None)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, None)
    }

    pub fn assistant(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self::new(Role::Assistant, content, Some(usage))
    }

    fn new(role: Role, content: impl Into<String>, usage: Option<TokenUsage>) -> Self {
        Self {
            role,
            content: content.into(),
            usage,
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A successful reply from the completion endpoint.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Per-request failures. All recoverable: the session survives every one of
/// these and the caller decides whether to resubmit.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("connection error: {0}")]
    Connection(String),
    /// Non-2xx status from the API; 429 is rate limiting.
    #[error("API error (HTTP {status}): {message}")]
    Status { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("{0}")]
    Other(String),
}

/// Configuration and startup failures. [`ConfigError::MissingCredential`] is
/// fatal: without it the chat surface cannot operate at all.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing API credential: set {0}")]
    MissingCredential(&'static str),
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("temperature {0} outside supported range 0.0..=1.5")]
    TemperatureOutOfRange(f64),
    #[error("settings file not found: {0}")]
    FileNotFound(std::path::PathBuf),
    #[error("settings parse error: {0}")]
    ParseError(String),
}

//! Session struct and transcript management.

use std::sync::atomic::AtomicBool;

use tracing::debug;
use uuid::Uuid;

use crate::token_tracker::TokenTracker;
use crate::{ConfigError, Message, Model, TEMPERATURE_MAX, TEMPERATURE_MIN};

/// Seed directive for every new transcript.
pub const DEFAULT_SYSTEM_PROMPT: &str = "solo habla español";

const DEFAULT_TEMPERATURE: f64 = 0.7;

/// A single conversation: transcript plus sampling configuration.
///
/// The transcript always starts with the seed system message and is owned
/// exclusively by the session; callers read it through [`Session::messages`]
/// and never mutate it directly. Each session is isolated — nothing is
/// shared between two sessions.
pub struct Session {
    pub(super) id: Uuid,
    pub(super) messages: Vec<Message>,
    pub(super) system_prompt: String,
    pub(super) model: Model,
    pub(super) temperature: f64,
    pub(super) tracker: TokenTracker,
    pub(super) busy: AtomicBool,
}

impl Session {
    pub fn new() -> Self {
        Self::with_system_prompt(DEFAULT_SYSTEM_PROMPT)
    }

    /// Create a session with a custom seed directive, fixed for the
    /// session's lifetime.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            system_prompt: prompt.into(),
            model: Model::default(),
            temperature: DEFAULT_TEMPERATURE,
            tracker: TokenTracker::new(),
            busy: AtomicBool::new(false),
        };
        session.reset();
        session
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Replace the transcript with the seed system message. Usage accounting
    /// survives a clear.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(Message::system(self.system_prompt.clone()));
    }

    /// Switch models. An actual change discards the conversation so a
    /// transcript never mixes turns from two models; re-selecting the
    /// current model keeps it.
    pub fn set_model(&mut self, model: Model) {
        if self.model == model {
            return;
        }
        debug!(session = %self.id, from = %self.model, to = %model, "model changed, clearing transcript");
        self.model = model;
        self.reset();
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), ConfigError> {
        if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&temperature) {
            return Err(ConfigError::TemperatureOutOfRange(temperature));
        }
        self.temperature = temperature;
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The full transcript, seed system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn tracker(&self) -> &TokenTracker {
        &self.tracker
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

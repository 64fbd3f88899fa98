//! The fixed model catalog offered by the chat surface.

use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// Models selectable in the chat surface.
///
/// The catalog is closed: the completion endpoint serves more models than
/// these, but the selector only ever offers this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    Llama33_70bVersatile,
    DeepseekR1DistillLlama70b,
    Gemma2_9bIt,
}

impl Model {
    pub const ALL: [Model; 3] = [
        Model::Llama33_70bVersatile,
        Model::DeepseekR1DistillLlama70b,
        Model::Gemma2_9bIt,
    ];

    /// Identifier sent on the wire.
    pub const fn id(self) -> &'static str {
        match self {
            Model::Llama33_70bVersatile => "llama-3.3-70b-versatile",
            Model::DeepseekR1DistillLlama70b => "deepseek-r1-distill-llama-70b",
            Model::Gemma2_9bIt => "gemma2-9b-it",
        }
    }

    /// Whether replies may open with a `<think>` reasoning span.
    pub const fn emits_reasoning(self) -> bool {
        matches!(self, Model::DeepseekR1DistillLlama70b)
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Llama33_70bVersatile
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::ALL
            .into_iter()
            .find(|model| model.id() == s)
            .ok_or_else(|| ConfigError::UnknownModel(s.to_string()))
    }
}

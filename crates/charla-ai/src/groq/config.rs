//! Groq API client configuration.

use std::fmt;

use crate::ConfigError;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Environment variable holding the API credential.
pub const CREDENTIAL_VAR: &str = "GROQ_API_KEY";

#[derive(Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub base_url: String,
}

impl fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read the credential from the process environment.
    ///
    /// Absence is fatal for the chat surface: callers are expected to report
    /// it once at startup and exit, not retry per request.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CREDENTIAL_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(ConfigError::MissingCredential(CREDENTIAL_VAR)),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_the_credential() {
        let config = GroqConfig::new("gsk_secreto");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("gsk_secreto"));
    }

    #[test]
    fn base_url_is_overridable() {
        let config = GroqConfig::new("k").with_base_url("http://localhost:9999/v1");
        assert_eq!(config.base_url, "http://localhost:9999/v1");
    }
}

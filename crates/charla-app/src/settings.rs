//! Settings file loading (`config.toml` under the OS config directory).
//!
//! All sections use `serde(default)` so a partial file works; a missing file
//! is created with a commented default on first run. Invalid settings fall
//! back to defaults with a warning rather than refusing to start.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use charla_ai::{ConfigError, Model, DEFAULT_SYSTEM_PROMPT, TEMPERATURE_MAX, TEMPERATURE_MIN};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chat: ChatSettings,
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Model id from the fixed catalog.
    pub default_model: String,
    pub temperature: f64,
    /// Seed directive for every new transcript.
    pub system_prompt: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_model: Model::default().id().to_string(),
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Print the model's reasoning block above answers when present.
    pub show_reasoning: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_reasoning: true,
        }
    }
}

/// Load settings from `path_override`, or the platform default path.
///
/// Any failure (unreadable file, bad TOML, values out of range) logs a
/// warning and returns defaults; settings problems never stop the app.
pub fn load(path_override: Option<&Path>) -> Settings {
    let path = match path_override {
        Some(path) => path.to_path_buf(),
        None => match default_path() {
            Some(path) => path,
            None => {
                warn!("could not determine config directory, using default settings");
                return Settings::default();
            }
        },
    };

    if !path.exists() {
        if path_override.is_none() {
            if let Err(e) = create_default_file(&path) {
                warn!("could not create default settings file: {e}");
            }
        } else {
            warn!("settings file {} not found, using defaults", path.display());
        }
        return Settings::default();
    }

    match load_from_path(&path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("settings problem ({e}), falling back to defaults");
            Settings::default()
        }
    }
}

pub fn load_from_path(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let settings: Settings = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    validate(&settings)?;
    info!("loaded settings from {}", path.display());
    Ok(settings)
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("charla").join("config.toml"))
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    settings.chat.default_model.parse::<Model>()?;
    if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&settings.chat.temperature) {
        return Err(ConfigError::TemperatureOutOfRange(settings.chat.temperature));
    }
    Ok(())
}

fn create_default_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, default_settings_toml())?;
    info!("created default settings at {}", path.display());
    Ok(())
}

/// Default TOML content with comments. Only overridden fields need to stay.
fn default_settings_toml() -> String {
    format!(
        r#"# Charla settings
# Only override what you want to change -- missing fields use defaults.

[chat]
default_model = "{model}"
temperature = 0.7
system_prompt = "{prompt}"

[ui]
show_reasoning = true
"#,
        model = Model::default().id(),
        prompt = DEFAULT_SYSTEM_PROMPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(validate(&Settings::default()).is_ok());
    }

    #[test]
    fn default_file_content_parses_to_defaults() {
        let parsed: Settings = toml::from_str(&default_settings_toml()).unwrap();
        assert_eq!(parsed.chat.default_model, Settings::default().chat.default_model);
        assert_eq!(parsed.chat.temperature, 0.7);
        assert!(parsed.ui.show_reasoning);
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let parsed: Settings = toml::from_str("[chat]\ntemperature = 1.2\n").unwrap();
        assert_eq!(parsed.chat.temperature, 1.2);
        assert_eq!(parsed.chat.default_model, Model::default().id());
        assert!(parsed.ui.show_reasoning);
    }

    #[test]
    fn catches_unknown_model() {
        let mut settings = Settings::default();
        settings.chat.default_model = "gpt-4o".into();
        let err = validate(&settings).unwrap_err().to_string();
        assert!(err.contains("gpt-4o"));
    }

    #[test]
    fn catches_temperature_out_of_range() {
        let mut settings = Settings::default();
        settings.chat.temperature = 1.6;
        assert!(validate(&settings).is_err());
        settings.chat.temperature = -0.5;
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn rejects_invalid_toml() {
        assert!(toml::from_str::<Settings>("[chat\noops").is_err());
    }
}

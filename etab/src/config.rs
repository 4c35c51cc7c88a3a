//! User configuration for etab.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/etab/config.toml`. Every key is
//! optional and a missing or broken file is a soft failure: the problem is
//! logged and defaults are used.
//!
//! ```toml
//! theme = "system"        # light | dark | system
//! model = "gpt-4"
//! reply_delay_ms = 1500
//!
//! [streaming]
//! enabled = true
//! rate_ms = 20
//! ```

use std::path::PathBuf;
use std::time::Duration;

use etab_core::responder::{ModelChoice, REPLY_DELAY};
use etab_core::reveal::DEFAULT_MESSAGE_RATE;
use serde::Deserialize;
use tracing::warn;

use crate::theme::ThemePreference;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemePreference,
    /// Model id shown in the selector; unknown ids fall back to the default.
    pub model: String,
    pub reply_delay_ms: u64,
    pub streaming: StreamingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Reveal replies gradually. When off, replies appear at once.
    pub enabled: bool,
    /// Milliseconds between revealed characters.
    pub rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: ThemePreference::default(),
            model: ModelChoice::default().id().to_owned(),
            reply_delay_ms: REPLY_DELAY.as_millis() as u64,
            streaming: StreamingConfig::default(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_ms: DEFAULT_MESSAGE_RATE.as_millis() as u64,
        }
    }
}

impl Config {
    pub fn model(&self) -> ModelChoice {
        ModelChoice::from_id(&self.model).unwrap_or_default()
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// Tick interval for reveals. A zero rate is bumped to one millisecond.
    pub fn reveal_rate(&self) -> Duration {
        Duration::from_millis(self.streaming.rate_ms.max(1))
    }
}

/// Returns the path to the etab config file.
///
/// Prefers `$XDG_CONFIG_HOME/etab/config.toml`; falls back to
/// `~/.config/etab/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join("config.toml")
}

/// Directory for the log file: `$XDG_STATE_HOME/etab`, else `~/.local/state/etab`.
pub fn state_dir() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state")
}

fn xdg_dir(var: &str, home_fallback: &str) -> PathBuf {
    let base = std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(home_fallback))
        })
        .unwrap_or_else(|| PathBuf::from(home_fallback));
    base.join("etab")
}

/// Parses config text.
///
/// # Errors
///
/// Returns the toml error for malformed input or mistyped keys.
pub fn parse(raw: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(raw)
}

/// Loads the config file, falling back to defaults on any problem.
pub fn load() -> Config {
    let path = config_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return Config::default(),
    };
    match parse(&raw) {
        Ok(config) => {
            if ModelChoice::from_id(&config.model).is_none() {
                warn!(model = %config.model, "unknown model in config, using default");
            }
            config
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "config parse error, using defaults");
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.theme, ThemePreference::System);
        assert_eq!(config.model(), ModelChoice::Gpt4);
        assert_eq!(config.reply_delay(), Duration::from_millis(1500));
        assert!(config.streaming.enabled);
        assert_eq!(config.reveal_rate(), Duration::from_millis(20));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse("theme = \"light\"\n[streaming]\nrate_ms = 5\n").unwrap();
        assert_eq!(config.theme, ThemePreference::Light);
        assert_eq!(config.reveal_rate(), Duration::from_millis(5));
        assert!(config.streaming.enabled);
        assert_eq!(config.reply_delay_ms, 1500);
    }

    #[test]
    fn bad_values_are_errors_or_fall_back() {
        assert!(parse("theme = \"sepia\"").is_err());
        assert!(parse("reply_delay_ms = \"soon\"").is_err());

        let config = parse("model = \"gpt-7\"\n[streaming]\nrate_ms = 0").unwrap();
        assert_eq!(config.model(), ModelChoice::Gpt4);
        assert_eq!(config.reveal_rate(), Duration::from_millis(1));
    }

    #[test]
    fn known_model_ids_are_honoured() {
        let config = parse("model = \"claude\"").unwrap();
        assert_eq!(config.model(), ModelChoice::Claude);
    }
}

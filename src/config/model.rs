//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a default so the client runs without a config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::irc::identity::Identity;
use crate::irc::reconnect::ReconnectPolicy;
use crate::irc::session::SessionSettings;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Channels followed on startup, without the `#`.
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub server: ServerConfig,
    /// Without an account the client can read but not post.
    #[serde(default)]
    pub account: Option<AccountConfig>,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            url: self.server.url.clone(),
            capabilities: self.server.capabilities.clone(),
            reconnect: ReconnectPolicy::from(&self.reconnect),
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.account
            .as_ref()
            .map(|a| Identity::new(a.login.clone(), &a.token))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            capabilities: default_capabilities(),
        }
    }
}

fn default_url() -> String {
    "wss://irc-ws.chat.twitch.tv".into()
}

fn default_capabilities() -> Vec<String> {
    vec!["twitch.tv/commands".into(), "twitch.tv/tags".into()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub login: String,
    /// OAuth token, with or without the `oauth:` prefix.
    pub token: String,
}

/// Backoff between reconnect attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Absent means retry forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: None,
            jitter_ms: 0,
        }
    }
}

fn default_interval_ms() -> u64 {
    2000
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        ReconnectPolicy {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}

/// Diagnostic log settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Append diagnostics to this file instead of stderr.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.channels.is_empty());
        assert!(config.account.is_none());
        assert_eq!(config.session_settings(), SessionSettings::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.identity().is_none());
    }

    #[test]
    fn test_full_file() {
        let config: AppConfig = toml::from_str(
            r#"
            channels = ["forsen", "xqc"]

            [server]
            url = "ws://localhost:8080"
            capabilities = []

            [account]
            login = "me"
            token = "oauth:abc"

            [reconnect]
            interval_ms = 500
            max_attempts = 5
            jitter_ms = 100

            [logging]
            level = "debug"
            file = "/tmp/crabline.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.channels, vec!["forsen", "xqc"]);
        let settings = config.session_settings();
        assert_eq!(settings.url, "ws://localhost:8080");
        assert!(settings.capabilities.is_empty());
        assert_eq!(
            settings.reconnect,
            ReconnectPolicy::fixed(Duration::from_millis(500))
                .with_max_attempts(5)
                .with_jitter(Duration::from_millis(100))
        );
        let identity = config.identity().unwrap();
        assert_eq!(identity.login(), "me");
        assert_eq!(identity.credential().pass_value(), "oauth:abc");
        assert_eq!(config.logging.file.as_deref(), Some("/tmp/crabline.log"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = toml::from_str("[reconnect]\nmax_attempts = 3\n").unwrap();
        assert_eq!(config.reconnect.interval_ms, 2000);
        assert_eq!(config.reconnect.max_attempts, Some(3));
        assert_eq!(config.server.url, "wss://irc-ws.chat.twitch.tv");
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = AppConfig::default();
        config.channels.push("foo".into());
        let text = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.channels, vec!["foo"]);
        assert_eq!(back.server.capabilities, config.server.capabilities);
    }
}

//! Rotor configuration
//!
//! [`RotorConfig`] is plain serde data with a default for every field, so it
//! can be layered from any source (file, environment, flags). Call
//! [`RotorConfig::validate`] before using it.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::artifact::{ClientsAdapter, DEFAULT_CLIENTS_POINTER};
use crate::core::ConfigError;
use crate::rotation::{RotationPolicy, RotationSchedule};
use crate::sink::CommandReload;

/// Configuration of a rotation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotorConfig {
    /// Days between two mints
    pub rotation_interval_days: i64,

    /// Days a superseded credential stays valid
    pub grace_period_days: i64,

    /// Durable state file
    pub state_path: PathBuf,

    /// Proxy configuration file
    pub config_path: PathBuf,

    /// JSON pointer of the client list inside the proxy configuration
    pub clients_pointer: String,

    /// Extra fields for every client entry rotor adds (e.g. `flow`)
    pub client_template: Map<String, Value>,

    /// Rotation policy
    pub policy: RotationPolicy,

    /// How to make the proxy reload its configuration
    pub reload: ReloadConfig,

    /// Telegram notifications; events are only logged when unset
    pub telegram: Option<TelegramConfig>,
}

impl Default for RotorConfig {
    fn default() -> Self {
        Self {
            rotation_interval_days: 30,
            grace_period_days: 14,
            state_path: PathBuf::from("/etc/xray/uuid_state.json"),
            config_path: PathBuf::from("/etc/xray/config.json"),
            clients_pointer: DEFAULT_CLIENTS_POINTER.to_string(),
            client_template: Map::new(),
            policy: RotationPolicy::default(),
            reload: ReloadConfig::default(),
            telegram: None,
        }
    }
}

impl RotorConfig {
    /// Check every field, logging a warning for accepted-but-unusual values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let schedule = self.schedule()?;
        self.clients_adapter()?;
        self.reload.validate()?;
        if let Some(telegram) = &self.telegram {
            telegram.validate()?;
        }

        if self.policy == RotationPolicy::Accumulate && schedule.allows_overlapping_generations() {
            warn!(
                rotation_interval_days = self.rotation_interval_days,
                grace_period_days = self.grace_period_days,
                "Grace period is not shorter than the rotation interval; \
                 several credential generations will be live at once"
            );
        }
        Ok(())
    }

    /// Rotation schedule from the day counts
    pub fn schedule(&self) -> Result<RotationSchedule, ConfigError> {
        RotationSchedule::from_days(self.rotation_interval_days, self.grace_period_days)
    }

    /// Client list accessor for the proxy configuration
    pub fn clients_adapter(&self) -> Result<ClientsAdapter, ConfigError> {
        Ok(ClientsAdapter::new(self.clients_pointer.clone())?
            .with_template(self.client_template.clone()))
    }
}

/// Reload command settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Program and arguments
    pub command: Vec<String>,

    /// Seconds before the command is killed
    pub timeout_secs: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            command: vec!["/etc/init.d/xray".to_string(), "restart".to_string()],
            timeout_secs: 60,
        }
    }
}

impl ReloadConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::MissingRequired {
                    field: "reload.command".to_string(),
                });
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reload.timeout_secs".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Build the reload sink
    pub fn build(&self) -> Result<CommandReload, ConfigError> {
        self.validate()?;
        CommandReload::from_argv(&self.command)
            .map(|reload| reload.with_timeout(Duration::from_secs(self.timeout_secs)))
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "reload.command".to_string(),
            })
    }
}

/// Telegram Bot API settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token (`123456:ABC...`)
    pub bot_token: String,

    /// Target chat; numeric ids are accepted as numbers or strings
    #[serde(deserialize_with = "string_or_integer")]
    pub chat_id: String,

    /// Bot API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
}

impl TelegramConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "telegram.bot_token".to_string(),
            });
        }
        if self.chat_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "telegram.chat_id".to_string(),
            });
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "telegram.api_base".to_string(),
                reason: format!("'{}' is not an http(s) URL", self.api_base),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "telegram.timeout_secs".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u64 {
    15
}

fn string_or_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = RotorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.policy, RotationPolicy::Handoff);
        assert_eq!(config.schedule().unwrap(), RotationSchedule::default());
        assert_eq!(config.reload.build().unwrap().command_line(), "/etc/init.d/xray restart");
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: RotorConfig = serde_json::from_value(json!({
            "policy": "accumulate",
            "grace_period_days": 7,
            "telegram": { "bot_token": "1:x", "chat_id": -1001234 }
        }))
        .unwrap();

        assert_eq!(config.policy, RotationPolicy::Accumulate);
        assert_eq!(config.rotation_interval_days, 30);
        assert_eq!(config.grace_period_days, 7);

        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.chat_id, "-1001234");
        assert_eq!(telegram.api_base, "https://api.telegram.org");
        assert_eq!(telegram.timeout(), Duration::from_secs(15));
    }

    #[rstest]
    #[case(json!({ "rotation_interval_days": 0 }), "rotation_interval_days")]
    #[case(json!({ "grace_period_days": 0 }), "grace_period_days")]
    #[case(json!({ "clients_pointer": "inbounds" }), "clients_pointer")]
    #[case(json!({ "reload": { "command": [] } }), "reload.command")]
    #[case(json!({ "reload": { "command": [""] } }), "reload.command")]
    #[case(json!({ "reload": { "timeout_secs": 0 } }), "reload.timeout_secs")]
    #[case(json!({ "telegram": { "bot_token": "", "chat_id": "1" } }), "telegram.bot_token")]
    #[case(json!({ "telegram": { "bot_token": "t", "chat_id": "1", "api_base": "ftp://x" } }), "telegram.api_base")]
    fn test_validate_rejects(#[case] raw: Value, #[case] field: &str) {
        let config: RotorConfig = serde_json::from_value(raw).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(field), "{err}");
    }

    #[test]
    fn test_accumulate_with_long_grace_is_accepted() {
        let config = RotorConfig {
            policy: RotationPolicy::Accumulate,
            rotation_interval_days: 30,
            grace_period_days: 45,
            ..RotorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_template_reaches_adapter() {
        let config: RotorConfig =
            serde_json::from_value(json!({ "client_template": { "flow": "xtls-rprx-vision" } }))
                .unwrap();
        let adapter = config.clients_adapter().unwrap();

        let mut doc = json!({ "inbounds": [{ "settings": { "clients": [] } }] });
        let id = crate::CredentialId::generate();
        adapter.add(&mut doc, id).unwrap();
        assert_eq!(doc["inbounds"][0]["settings"]["clients"][0]["flow"], "xtls-rprx-vision");
    }

    #[test]
    fn test_telegram_debug_redacts_token() {
        let telegram = TelegramConfig {
            bot_token: "123:SECRET".to_string(),
            chat_id: "1".to_string(),
            api_base: default_api_base(),
            timeout_secs: 15,
        };
        assert!(!format!("{telegram:?}").contains("SECRET"));
    }
}

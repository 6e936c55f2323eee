//! Layered settings: defaults → TOML file → `ROTOR_*` environment → flags

use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use rotor_credential::{RotationPolicy, RotorConfig};
use serde::{Deserialize, Serialize};

/// Everything the binary reads from its configuration sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rotation settings
    #[serde(flatten)]
    pub rotor: RotorConfig,

    /// Logger settings
    pub log: rotor_log::Config,
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<RotationPolicy>,
}

impl Settings {
    /// Load from `file` (optional), the environment and `overrides`
    pub fn load(file: &Path, overrides: &Overrides) -> anyhow::Result<Self> {
        Self::figment(file, overrides)
            .extract()
            .with_context(|| format!("failed to load configuration (file: {})", file.display()))
    }

    fn figment(file: &Path, overrides: &Overrides) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            // ROTOR_LOG is the log filter, not the `log` table
            .merge(
                Env::prefixed("ROTOR_")
                    .ignore(&["log", "log_format", "config"])
                    .split("__"),
            )
            .merge(Serialized::defaults(overrides))
    }

    /// Logger configuration, with `ROTOR_LOG`/`RUST_LOG` and `--log-level`
    /// taking precedence over the file
    pub fn log_config(&self, log_level: Option<&str>) -> rotor_log::Config {
        let mut config = self.log.clone();
        let from_env = std::env::var("ROTOR_LOG")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok());
        if let Some(level) = log_level.map(str::to_string).or(from_env) {
            config.level = level;
        }
        config
    }
}

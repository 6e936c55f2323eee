//! Configuration presets for common scenarios

use super::{Config, Format};

impl Config {
    /// Create configuration from environment variables
    ///
    /// `ROTOR_LOG` (or `RUST_LOG`) sets the filter, `ROTOR_LOG_FORMAT` the
    /// format.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup("ROTOR_LOG").or_else(|| lookup("RUST_LOG")) {
            config.level = level;
        }

        if let Some(format) = lookup("ROTOR_LOG_FORMAT") {
            // Unknown formats keep the default
            if let Ok(format) = format.parse() {
                config.format = format;
            }
        }

        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            colors: true,
            target: true,
        }
    }

    /// Production configuration (compact, info level, no colors)
    ///
    /// Output usually ends up in syslog or a cron mail, so one line per
    /// event without escape codes.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

//! # Rotor Log
//!
//! Logging setup shared by the rotor binaries. Everything goes to stderr so
//! stdout stays free for command output.
//!
//! ```rust,no_run
//! fn main() -> Result<(), rotor_log::LogError> {
//!     rotor_log::auto_init()?;
//!     tracing::info!(policy = "handoff", "Starting rotation");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod builder;
mod config;
mod error;

pub use builder::LoggerBuilder;
pub use config::{Config, Format};
pub use error::{LogError, LogResult};

/// Pick a configuration from the environment and initialize
///
/// `ROTOR_LOG`/`RUST_LOG` win; otherwise debug builds log pretty at debug
/// level and release builds log compact at info level.
pub fn auto_init() -> LogResult<()> {
    if std::env::var_os("ROTOR_LOG").is_some() || std::env::var_os("RUST_LOG").is_some() {
        init_with(Config::from_env())
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::production())
    }
}

/// Initialize with default configuration
pub fn init() -> LogResult<()> {
    init_with(Config::default())
}

/// Initialize with custom configuration
pub fn init_with(config: Config) -> LogResult<()> {
    LoggerBuilder::from_config(config).build()
}

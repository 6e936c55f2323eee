//! Rotor Credential - scheduled UUID rotation for proxy client lists
//!
//! Keeps the client identifiers of a proxy configuration (xray `clients[]`)
//! fresh: mints a new credential every rotation interval and removes old
//! ones once their grace period has passed, so connected clients have time
//! to migrate.
//!
//! # Features
//!
//! - **Two policies** - per-credential expiry (`accumulate`) or a single
//!   current credential with explicit handoff (`handoff`)
//! - **Crash-safe files** - state and configuration are written via temp
//!   file + rename
//! - **Legacy state** - reads the state files of the original rotation
//!   scripts
//! - **Best-effort sinks** - reload and notification failures never abort a
//!   run
#![deny(unsafe_code)]
#![forbid(unsafe_code)]

/// Proxy configuration file and its client list
pub mod artifact;
/// Rotor configuration
pub mod config;
/// Core types and errors
pub mod core;
/// Run orchestration
pub mod orchestrator;
/// Rotation policy and decision engine
pub mod rotation;
/// Reload and notification sinks
pub mod sink;
/// Durable rotation state
pub mod state;
/// Filesystem and time helpers
pub mod utils;

// ── Root re-exports ─────────────────────────────────────────────────────────
// Commonly-used types available directly as `rotor_credential::TypeName`.

pub use crate::core::{
    ConfigArtifactError, ConfigError, CredentialId, RotorError, RotorResult, SinkError,
    StateCorruptionError, StorageError, ValidationError,
};

pub use crate::config::{ReloadConfig, RotorConfig, TelegramConfig};
pub use crate::orchestrator::{Rotator, RunReport, StatusReport};
pub use crate::rotation::{RotationEngine, RotationPolicy, RotationSchedule};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::artifact::{ClientsAdapter, ConfigArtifact};
    pub use crate::config::RotorConfig;
    pub use crate::core::{CredentialId, RotorError, RotorResult, SinkError};
    pub use crate::orchestrator::{Rotator, RunReport};
    pub use crate::rotation::{RotationEngine, RotationOutcome, RotationPolicy, RotationSchedule};
    pub use crate::sink::{
        CommandReload, LogNotifier, NotificationEvent, NotificationSender, ReloadSignal,
    };
    pub use crate::state::{RotationState, StateStore};

    #[cfg(feature = "telegram")]
    pub use crate::sink::TelegramNotifier;
}

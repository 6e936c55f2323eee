//! Error types for credential rotation
//!
//! This module defines the error taxonomy of a rotation run:
//! - [`StorageError`]: durable state unreadable or unwritable (fatal)
//! - [`StateCorruptionError`]: durable state parses but violates the schema
//!   (recovered by falling back to the default state)
//! - [`ConfigArtifactError`]: the proxy configuration cannot be read, parsed
//!   or written (fatal)
//! - [`SinkError`]: reload or notification failed (logged, never fatal)
//! - [`ConfigError`]: rotor's own configuration is invalid
//!
//! Every [`RotorError`] aborts the run. Sink failures never become one; they
//! are counted in the run report. Fatal errors convert via `From`, so `?`
//! works across the orchestrator:
//!
//! ```
//! use rotor_credential::{RotorError, StorageError};
//! use std::path::PathBuf;
//!
//! let err: RotorError = StorageError::WriteFailure {
//!     path: PathBuf::from("/etc/xray/uuid_state.json"),
//!     source: std::io::Error::other("disk full"),
//! }
//! .into();
//! assert!(matches!(err, RotorError::Storage(_)));
//! assert!(err.to_string().contains("uuid_state.json"));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error of a rotation run
#[derive(Debug, Error)]
pub enum RotorError {
    /// Durable state I/O failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Proxy configuration artifact could not be read or written
    #[error(transparent)]
    Artifact(#[from] ConfigArtifactError),

    /// Rotor configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for rotation runs
pub type RotorResult<T> = Result<T, RotorError>;

/// Durable state storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read the state file (anything other than "not found")
    #[error("Failed to read state file '{}': {source}", path.display())]
    ReadFailure {
        /// State file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the state file
    #[error("Failed to write state file '{}': {source}", path.display())]
    WriteFailure {
        /// State file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to encode the state before writing
    #[error("Failed to encode rotation state: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Durable state parsed but does not match the expected schema
#[derive(Debug, Error)]
#[error("Rotation state in '{}' is corrupt: {source}", path.display())]
pub struct StateCorruptionError {
    /// State file path
    pub path: PathBuf,
    /// Decoder error (malformed JSON, bad timestamp, bad UUID, ...)
    #[source]
    pub source: serde_json::Error,
}

/// Proxy configuration artifact errors
#[derive(Debug, Error)]
pub enum ConfigArtifactError {
    /// Failed to read the configuration file
    #[error("Failed to read proxy config '{}': {source}", path.display())]
    Read {
        /// Configuration file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON
    #[error("Failed to parse proxy config '{}': {source}", path.display())]
    Parse {
        /// Configuration file path
        path: PathBuf,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// The client list pointer does not resolve to an array
    #[error("Proxy config '{}' has no client list at '{pointer}'", path.display())]
    MissingClients {
        /// Configuration file path
        path: PathBuf,
        /// JSON pointer that was looked up
        pointer: String,
    },

    /// Failed to write the configuration file
    #[error("Failed to write proxy config '{}': {source}", path.display())]
    Write {
        /// Configuration file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Reload or notification failure
///
/// Best-effort: logged and counted, never aborts a run.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Reload command could not be started
    #[error("Failed to start reload command '{command}': {source}")]
    ReloadSpawn {
        /// Program that was executed
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reload command exited unsuccessfully
    #[error("Reload command '{command}' exited with {status}")]
    ReloadFailed {
        /// Program that was executed
        command: String,
        /// Exit status description
        status: String,
    },

    /// Reload command did not finish in time
    #[error("Reload command '{command}' timed out after {timeout:?}")]
    ReloadTimeout {
        /// Program that was executed
        command: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// Notification delivery failed
    #[error("Notification via {channel} failed: {reason}")]
    Notify {
        /// Channel name (e.g. "telegram")
        channel: &'static str,
        /// Failure description
        reason: String,
    },
}

/// Validation errors for input values
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Credential identifier is not a UUID
    #[error("Invalid credential ID '{id}': {reason}")]
    InvalidCredentialId {
        /// The rejected value
        id: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Rotor configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds an unusable value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// A required field is missing or empty
    #[error("Missing required configuration: {field}")]
    MissingRequired {
        /// Field name
        field: String,
    },
}

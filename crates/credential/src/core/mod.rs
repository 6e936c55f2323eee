//! Core types: credential identity and the error taxonomy

mod error;
mod id;

pub use error::{
    ConfigArtifactError, ConfigError, RotorError, RotorResult, SinkError, StateCorruptionError,
    StorageError, ValidationError,
};
pub use id::CredentialId;

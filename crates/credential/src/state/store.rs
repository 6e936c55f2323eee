//! Durable state store
//!
//! Reads and writes the rotation state file. A missing file is a first run,
//! a corrupt file is logged and replaced by the empty state, and writes go
//! through a temp file + rename so readers never see a partial record.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::RotationState;
use crate::core::{StateCorruptionError, StorageError};
use crate::rotation::RotationPolicy;
use crate::utils::{atomic_write, ensure_parent_dir};

/// File-backed store for [`RotationState`]
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store for the state file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// State file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state for `policy`
    ///
    /// Returns the empty state when the file does not exist yet, or when it
    /// exists but cannot be decoded (losing history only risks one early
    /// rotation, never a live credential).
    ///
    /// # Errors
    ///
    /// * `ReadFailure` for any I/O error other than "not found"
    pub async fn load(&self, policy: RotationPolicy) -> Result<RotationState, StorageError> {
        match self.load_strict(policy).await? {
            Ok(state) => Ok(state),
            Err(corruption) => {
                warn!(
                    path = %self.path.display(),
                    error = %corruption,
                    "Rotation state is corrupt, starting from an empty state"
                );
                Ok(RotationState::empty(policy))
            }
        }
    }

    /// Load the state for `policy`, surfacing corruption to the caller
    pub async fn load_strict(
        &self,
        policy: RotationPolicy,
    ) -> Result<Result<RotationState, StateCorruptionError>, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No rotation state yet, first run");
                return Ok(Ok(RotationState::empty(policy)));
            }
            Err(source) => {
                return Err(StorageError::ReadFailure {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let decoded = RotationState::decode(&bytes, policy).map_err(|source| StateCorruptionError {
            path: self.path.clone(),
            source,
        });
        if decoded.is_ok() {
            let foreign = RotationState::foreign_records(&bytes, policy);
            if foreign > 0 {
                warn!(
                    path = %self.path.display(),
                    policy = policy.as_str(),
                    records = foreign,
                    "State file holds records of the other policy; their credentials will not be retired"
                );
            }
        }
        Ok(decoded)
    }

    /// Overwrite the state file, creating its directory if needed
    ///
    /// # Errors
    ///
    /// * `Encode` if the state cannot be serialised
    /// * `WriteFailure` if the directory or file cannot be written
    pub async fn save(&self, state: &RotationState) -> Result<(), StorageError> {
        let bytes = state.encode().map_err(StorageError::Encode)?;

        ensure_parent_dir(&self.path)
            .await
            .map_err(|source| StorageError::WriteFailure {
                path: self.path.clone(),
                source,
            })?;

        atomic_write(&self.path, &bytes)
            .await
            .map_err(|source| StorageError::WriteFailure {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "Rotation state saved");
        Ok(())
    }
}

//! Proxy configuration artifact
//!
//! [`ConfigArtifact`] owns the parsed configuration file and exposes the
//! credential operations of [`ClientsAdapter`] on it. Key order of the
//! document is preserved on write, so rotor only ever changes the client
//! list.

mod clients;

pub use clients::{ClientsAdapter, DEFAULT_CLIENTS_POINTER};

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde_json::Value;
use tracing::debug;

use crate::core::{ConfigArtifactError, CredentialId};
use crate::utils::atomic_write;

/// A loaded proxy configuration file
#[derive(Debug, Clone)]
pub struct ConfigArtifact {
    path: PathBuf,
    document: Value,
    clients: ClientsAdapter,
}

impl ConfigArtifact {
    /// Read and parse the configuration at `path`
    ///
    /// # Errors
    ///
    /// * `Read` / `Parse` if the file cannot be read or is not JSON
    /// * `MissingClients` if the adapter's pointer does not resolve to an
    ///   array
    pub async fn load(
        path: impl Into<PathBuf>,
        clients: ClientsAdapter,
    ) -> Result<Self, ConfigArtifactError> {
        let path = path.into();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ConfigArtifactError::Read {
                path: path.clone(),
                source,
            })?;
        let document: Value =
            serde_json::from_slice(&bytes).map_err(|source| ConfigArtifactError::Parse {
                path: path.clone(),
                source,
            })?;

        Self::from_document(path, document, clients)
    }

    /// Wrap an already-parsed document
    pub fn from_document(
        path: impl Into<PathBuf>,
        document: Value,
        clients: ClientsAdapter,
    ) -> Result<Self, ConfigArtifactError> {
        let artifact = Self {
            path: path.into(),
            document,
            clients,
        };
        artifact.list()?;
        Ok(artifact)
    }

    /// Configuration file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed document
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Live credentials in document order
    pub fn list(&self) -> Result<IndexSet<CredentialId>, ConfigArtifactError> {
        self.clients
            .list(&self.document)
            .ok_or_else(|| self.missing_clients())
    }

    /// Append a client entry for `id`
    pub fn add(&mut self, id: CredentialId) -> Result<(), ConfigArtifactError> {
        match self.clients.add(&mut self.document, id) {
            Some(()) => Ok(()),
            None => Err(self.missing_clients()),
        }
    }

    /// Remove every client entry for `id`, returning how many were removed
    pub fn remove(&mut self, id: CredentialId) -> Result<usize, ConfigArtifactError> {
        match self.clients.remove(&mut self.document, id) {
            Some(removed) => Ok(removed),
            None => Err(self.missing_clients()),
        }
    }

    /// Write the document back, pretty-printed, via temp file + rename
    pub async fn save(&self) -> Result<(), ConfigArtifactError> {
        let mut bytes = serde_json::to_vec_pretty(&self.document).map_err(|e| {
            ConfigArtifactError::Write {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;
        bytes.push(b'\n');

        atomic_write(&self.path, &bytes)
            .await
            .map_err(|source| ConfigArtifactError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "Proxy configuration written");
        Ok(())
    }

    fn missing_clients(&self) -> ConfigArtifactError {
        ConfigArtifactError::MissingClients {
            path: self.path.clone(),
            pointer: self.clients.pointer().to_string(),
        }
    }
}

//! Credential identifier
//!
//! A [`CredentialId`] is the UUID a proxy client authenticates with. It has no
//! structure beyond identity and equality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::ValidationError;

/// Client access credential (UUID)
///
/// Serialised in hyphenated lowercase form, which is what proxy client lists
/// and the durable state file both store.
///
/// # Examples
///
/// ```
/// use rotor_credential::CredentialId;
///
/// let id: CredentialId = "6f1c0b5e-2d7a-4a43-9a57-0d4c3f0f8a11".parse().unwrap();
/// assert_eq!(id.to_string(), "6f1c0b5e-2d7a-4a43-9a57-0d4c3f0f8a11");
///
/// assert!("not-a-uuid".parse::<CredentialId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(Uuid);

impl CredentialId {
    /// Mints a fresh random (v4) credential
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for CredentialId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| ValidationError::InvalidCredentialId {
                id: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<Uuid> for CredentialId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = CredentialId::generate();
        let b = CredentialId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_parse_accepts_uppercase_and_whitespace() {
        let id: CredentialId = " 6F1C0B5E-2D7A-4A43-9A57-0D4C3F0F8A11 ".parse().unwrap();
        assert_eq!(id.to_string(), "6f1c0b5e-2d7a-4a43-9a57-0d4c3f0f8a11");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "user@example.com".parse::<CredentialId>().unwrap_err();
        assert!(err.to_string().contains("user@example.com"));
    }

    #[test]
    fn test_serde_is_plain_string() {
        let id: CredentialId = "6f1c0b5e-2d7a-4a43-9a57-0d4c3f0f8a11".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6f1c0b5e-2d7a-4a43-9a57-0d4c3f0f8a11\"");
        let back: CredentialId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

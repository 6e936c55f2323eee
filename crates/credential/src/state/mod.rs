//! Durable rotation state
//!
//! The state record describes which credentials rotor minted, when they are
//! due to change state and when the last rotation happened. Its shape depends
//! on the [`RotationPolicy`]:
//!
//! ```text
//! accumulate: { "active": [{ "uuid", "created", "expires" }], "last_rotation" }
//! handoff:    { "current_uuid", "pending_removals": [{ "uuid", "remove_at" }], "last_rotation" }
//! ```
//!
//! Unknown fields are ignored and missing fields take their defaults, so a
//! state file written by a newer version still loads. Records written under
//! the other policy are not carried over; [`StateStore`] warns when it finds
//! them.

mod store;

pub use store::StateStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::CredentialId;
use crate::rotation::{RetiredCredential, RotationPolicy};
use crate::utils::time::timestamp;

/// Rotation history of one credential (accumulate policy)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    /// Credential
    #[serde(rename = "uuid")]
    pub id: CredentialId,

    /// When the credential was minted
    #[serde(rename = "created", with = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// When the credential becomes eligible for removal
    #[serde(rename = "expires", with = "timestamp")]
    pub retire_at: DateTime<Utc>,
}

impl LifecycleRecord {
    /// Whether the record's retirement time has been reached
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.retire_at <= now
    }
}

/// A credential queued for removal (handoff policy)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRemoval {
    /// Credential
    #[serde(rename = "uuid")]
    pub id: CredentialId,

    /// When the credential becomes eligible for removal
    #[serde(rename = "remove_at", with = "timestamp")]
    pub retire_at: DateTime<Utc>,
}

impl PendingRemoval {
    /// Whether the removal time has been reached
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.retire_at <= now
    }
}

/// State of the accumulate policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatingState {
    /// Minted credentials that have not reached their retirement time
    pub active: Vec<LifecycleRecord>,

    /// Time of the last mint
    #[serde(with = "timestamp::option")]
    pub last_rotation: Option<DateTime<Utc>>,
}

/// State of the handoff policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffState {
    /// The credential clients should be using
    #[serde(rename = "current_uuid")]
    pub current: Option<CredentialId>,

    /// Superseded credentials waiting out their grace period
    pub pending_removals: Vec<PendingRemoval>,

    /// Time of the last mint
    #[serde(with = "timestamp::option")]
    pub last_rotation: Option<DateTime<Utc>>,
}

/// Presence of each policy's fields in a state file
#[derive(Deserialize, Default)]
#[serde(default)]
struct PolicyFields {
    active: Option<Vec<serde::de::IgnoredAny>>,
    current_uuid: Option<serde::de::IgnoredAny>,
    pending_removals: Option<Vec<serde::de::IgnoredAny>>,
}

/// Durable rotation state, one shape per policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RotationState {
    /// [`RotationPolicy::Accumulate`]
    Accumulating(AccumulatingState),
    /// [`RotationPolicy::Handoff`]
    Handoff(HandoffState),
}

impl RotationState {
    /// First-run state for `policy`
    pub fn empty(policy: RotationPolicy) -> Self {
        match policy {
            RotationPolicy::Accumulate => RotationState::Accumulating(AccumulatingState::default()),
            RotationPolicy::Handoff => RotationState::Handoff(HandoffState::default()),
        }
    }

    /// Decode a state file for `policy`
    pub fn decode(bytes: &[u8], policy: RotationPolicy) -> Result<Self, serde_json::Error> {
        match policy {
            RotationPolicy::Accumulate => serde_json::from_slice(bytes).map(RotationState::Accumulating),
            RotationPolicy::Handoff => serde_json::from_slice(bytes).map(RotationState::Handoff),
        }
    }

    /// Number of records in `bytes` that only the other policy reads
    ///
    /// Decoding for `policy` ignores them, so the credentials they track are
    /// never retired by rotor.
    pub fn foreign_records(bytes: &[u8], policy: RotationPolicy) -> usize {
        let Ok(fields) = serde_json::from_slice::<PolicyFields>(bytes) else {
            return 0;
        };
        match policy {
            RotationPolicy::Accumulate => {
                usize::from(fields.current_uuid.is_some())
                    + fields.pending_removals.map_or(0, |p| p.len())
            }
            RotationPolicy::Handoff => fields.active.map_or(0, |a| a.len()),
        }
    }

    /// Encode for writing to disk (pretty, 2-space indent)
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Policy this state belongs to
    pub fn policy(&self) -> RotationPolicy {
        match self {
            RotationState::Accumulating(_) => RotationPolicy::Accumulate,
            RotationState::Handoff(_) => RotationPolicy::Handoff,
        }
    }

    /// Time of the last mint, if any
    pub fn last_rotation(&self) -> Option<DateTime<Utc>> {
        match self {
            RotationState::Accumulating(s) => s.last_rotation,
            RotationState::Handoff(s) => s.last_rotation,
        }
    }

    /// Credentials the state still tracks, in state order
    pub fn tracked(&self) -> Vec<CredentialId> {
        match self {
            RotationState::Accumulating(s) => s.active.iter().map(|r| r.id).collect(),
            RotationState::Handoff(s) => s
                .current
                .iter()
                .copied()
                .chain(s.pending_removals.iter().map(|p| p.id))
                .collect(),
        }
    }

    /// Put a retirement back into the queue
    ///
    /// Used when the retirement could not be written to the proxy
    /// configuration, so the next run retries it instead of forgetting it.
    pub fn requeue(&mut self, retired: &RetiredCredential) {
        match self {
            RotationState::Accumulating(s) => {
                if !s.active.iter().any(|r| r.id == retired.id) {
                    s.active.push(LifecycleRecord {
                        id: retired.id,
                        created_at: retired.created_at.unwrap_or(retired.retire_at),
                        retire_at: retired.retire_at,
                    });
                }
            }
            RotationState::Handoff(s) => {
                if !s.pending_removals.iter().any(|p| p.id == retired.id) {
                    s.pending_removals.push(PendingRemoval {
                        id: retired.id,
                        retire_at: retired.retire_at,
                    });
                }
            }
        }
    }
}

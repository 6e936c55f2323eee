//! Rotation engine
//!
//! Pure decision logic: given the current time, the durable state and the
//! live credential set, decide whether to mint a credential and which
//! scheduled credentials to retire. The engine performs no I/O and never
//! fails; malformed state is rejected earlier, when it is decoded.
//!
//! The live set is ground truth for whether a credential still exists; the
//! state is ground truth for when a credential is due to change.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use tracing::debug;

use super::policy::RotationSchedule;
use crate::core::CredentialId;
use crate::state::{
    AccumulatingState, HandoffState, LifecycleRecord, PendingRemoval, RotationState,
};

/// A credential minted by this evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedCredential {
    /// New credential
    pub id: CredentialId,

    /// Mint time
    pub created_at: DateTime<Utc>,

    /// When the new credential itself retires (accumulate policy)
    pub retire_at: Option<DateTime<Utc>>,

    /// The credential it replaces and that credential's removal time
    /// (handoff policy)
    pub superseded: Option<PendingRemoval>,
}

/// A live credential whose retirement time has been reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetiredCredential {
    /// Credential to remove from the live set
    pub id: CredentialId,

    /// Mint time, when the state recorded one
    pub created_at: Option<DateTime<Utc>>,

    /// Scheduled retirement time that was reached
    pub retire_at: DateTime<Utc>,
}

/// Result of one engine evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOutcome {
    /// State to persist
    pub state: RotationState,

    /// Credential to add to the live set
    pub minted: Option<MintedCredential>,

    /// Credentials to remove from the live set, in schedule order
    pub retired: Vec<RetiredCredential>,

    /// Live credential adopted as current without minting (handoff bootstrap)
    pub adopted: Option<CredentialId>,

    /// Due entries dropped because they were no longer live
    pub dropped: Vec<CredentialId>,
}

impl RotationOutcome {
    /// Whether the live set has to change
    pub fn has_mutations(&self) -> bool {
        self.minted.is_some() || !self.retired.is_empty()
    }
}

/// Rotation decision logic for both policies
///
/// The policy is selected by the shape of the [`RotationState`] passed in.
///
/// # Example
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use indexmap::IndexSet;
/// use rotor_credential::rotation::{RotationEngine, RotationPolicy, RotationSchedule};
/// use rotor_credential::state::RotationState;
///
/// let engine = RotationEngine::new(RotationSchedule::from_days(30, 14).unwrap());
/// let now = Utc::now();
///
/// let first = engine.evaluate(now, RotationState::empty(RotationPolicy::Handoff), &IndexSet::new());
/// let minted = first.minted.expect("first run always mints");
///
/// let live = IndexSet::from([minted.id]);
/// let next = engine.evaluate(now + TimeDelta::days(1), first.state, &live);
/// assert!(!next.has_mutations());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationEngine {
    schedule: RotationSchedule,
}

impl RotationEngine {
    /// Create an engine for `schedule`
    pub fn new(schedule: RotationSchedule) -> Self {
        Self { schedule }
    }

    /// Get the schedule
    pub fn schedule(&self) -> &RotationSchedule {
        &self.schedule
    }

    /// Evaluate with freshly generated v4 credentials
    pub fn evaluate(
        &self,
        now: DateTime<Utc>,
        state: RotationState,
        live: &IndexSet<CredentialId>,
    ) -> RotationOutcome {
        self.evaluate_with(now, state, live, CredentialId::generate)
    }

    /// Evaluate, calling `mint` at most once if a rotation is due
    pub fn evaluate_with(
        &self,
        now: DateTime<Utc>,
        state: RotationState,
        live: &IndexSet<CredentialId>,
        mint: impl FnOnce() -> CredentialId,
    ) -> RotationOutcome {
        match state {
            RotationState::Accumulating(s) => self.accumulate(now, s, live, mint),
            RotationState::Handoff(s) => self.handoff(now, s, live, mint),
        }
    }

    fn accumulate(
        &self,
        now: DateTime<Utc>,
        mut state: AccumulatingState,
        live: &IndexSet<CredentialId>,
        mint: impl FnOnce() -> CredentialId,
    ) -> RotationOutcome {
        let mut minted = None;
        if self.schedule.is_rotation_due(state.last_rotation, now) {
            let record = LifecycleRecord {
                id: mint(),
                created_at: now,
                retire_at: self.schedule.retire_at(now),
            };
            debug!(credential_id = %record.id, retire_at = %record.retire_at, "Rotation due, minting");
            minted = Some(MintedCredential {
                id: record.id,
                created_at: now,
                retire_at: Some(record.retire_at),
                superseded: None,
            });
            state.active.push(record);
            state.last_rotation = Some(now);
        }

        let mut retired = Vec::new();
        let mut dropped = Vec::new();
        // A record leaves `active` once its time has passed, live or not
        state.active.retain(|record| {
            if !record.is_due(now) {
                return true;
            }
            if live.contains(&record.id) {
                retired.push(RetiredCredential {
                    id: record.id,
                    created_at: Some(record.created_at),
                    retire_at: record.retire_at,
                });
            } else {
                dropped.push(record.id);
            }
            false
        });

        RotationOutcome {
            state: RotationState::Accumulating(state),
            minted,
            retired,
            adopted: None,
            dropped,
        }
    }

    fn handoff(
        &self,
        now: DateTime<Utc>,
        mut state: HandoffState,
        live: &IndexSet<CredentialId>,
        mint: impl FnOnce() -> CredentialId,
    ) -> RotationOutcome {
        let mut adopted = None;
        if state.current.is_none() {
            // Most recently added client becomes current
            if let Some(&last) = live.last() {
                debug!(credential_id = %last, "Adopting live credential as current");
                state.current = Some(last);
                adopted = Some(last);
            }
        }

        let mut minted = None;
        if self.schedule.is_rotation_due(state.last_rotation, now) {
            let id = mint();
            let previous = state.current.replace(id);

            let superseded = match previous {
                Some(old) if old != id && live.contains(&old) => {
                    let entry = PendingRemoval {
                        id: old,
                        retire_at: self.schedule.retire_at(now),
                    };
                    match state.pending_removals.iter_mut().find(|p| p.id == old) {
                        Some(existing) => existing.retire_at = entry.retire_at,
                        None => state.pending_removals.push(entry.clone()),
                    }
                    Some(entry)
                }
                _ => None,
            };

            debug!(credential_id = %id, previous = ?previous, "Rotation due, minting");
            minted = Some(MintedCredential {
                id,
                created_at: now,
                retire_at: None,
                superseded,
            });
            state.last_rotation = Some(now);
        }

        let current = state.current;
        let mut retired = Vec::new();
        let mut dropped = Vec::new();
        state.pending_removals.retain(|entry| {
            if !entry.is_due(now) {
                return true;
            }
            // Never remove the current credential, even if it was queued
            if Some(entry.id) == current {
                return true;
            }
            if live.contains(&entry.id) {
                retired.push(RetiredCredential {
                    id: entry.id,
                    created_at: None,
                    retire_at: entry.retire_at,
                });
            } else {
                dropped.push(entry.id);
            }
            false
        });

        RotationOutcome {
            state: RotationState::Handoff(state),
            minted,
            retired,
            adopted,
            dropped,
        }
    }
}

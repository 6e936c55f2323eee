//! Credential rotation
//!
//! Two policies are supported:
//!
//! - [`RotationPolicy::Accumulate`]: each minted credential carries its own
//!   retirement time (`created + grace_period`).
//! - [`RotationPolicy::Handoff`]: one current credential; minting a new one
//!   queues the previous one for removal at `now + grace_period`.
//!
//! [`RotationEngine`] holds the decision logic for both and performs no I/O.

pub mod engine;
pub mod policy;

pub use engine::{MintedCredential, RetiredCredential, RotationEngine, RotationOutcome};
pub use policy::{RotationPolicy, RotationSchedule};

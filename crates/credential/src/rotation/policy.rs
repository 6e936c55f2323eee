//! Rotation Policy Types
//!
//! Defines when credentials rotate and how retired generations are tracked.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::ConfigError;
use crate::utils::days;

/// Rotation policy variant
///
/// # Examples
///
/// ```
/// use rotor_credential::rotation::RotationPolicy;
///
/// let policy: RotationPolicy = "accumulate".parse().unwrap();
/// assert_eq!(policy, RotationPolicy::Accumulate);
/// assert_eq!("B".parse::<RotationPolicy>().unwrap(), RotationPolicy::Handoff);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Every minted credential gets its own retirement time; generations may
    /// overlap when the grace period exceeds the rotation interval
    #[serde(alias = "a", alias = "A")]
    Accumulate,

    /// Exactly one current credential; the previous one is queued for
    /// removal at handoff
    #[default]
    #[serde(alias = "b", alias = "B")]
    Handoff,
}

impl RotationPolicy {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationPolicy::Accumulate => "accumulate",
            RotationPolicy::Handoff => "handoff",
        }
    }
}

impl fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accumulate" | "a" => Ok(RotationPolicy::Accumulate),
            "handoff" | "b" => Ok(RotationPolicy::Handoff),
            other => Err(ConfigError::InvalidValue {
                field: "policy".to_string(),
                reason: format!("unknown policy '{other}' (expected 'accumulate' or 'handoff')"),
            }),
        }
    }
}

/// Rotation cadence and grace period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSchedule {
    /// Minimum time between two mints
    interval: TimeDelta,

    /// Time a superseded credential stays valid
    grace_period: TimeDelta,
}

impl RotationSchedule {
    /// Create a schedule with validation
    ///
    /// # Errors
    ///
    /// * `InvalidValue` if `interval` or `grace_period` is not positive
    pub fn new(interval: TimeDelta, grace_period: TimeDelta) -> Result<Self, ConfigError> {
        if interval <= TimeDelta::zero() {
            return Err(ConfigError::InvalidValue {
                field: "rotation_interval_days".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if grace_period <= TimeDelta::zero() {
            return Err(ConfigError::InvalidValue {
                field: "grace_period_days".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(Self {
            interval,
            grace_period,
        })
    }

    /// Create a schedule from whole days
    ///
    /// ```
    /// use rotor_credential::rotation::RotationSchedule;
    ///
    /// let schedule = RotationSchedule::from_days(30, 14).unwrap();
    /// assert_eq!(schedule.interval().num_days(), 30);
    /// assert!(RotationSchedule::from_days(0, 14).is_err());
    /// ```
    pub fn from_days(interval_days: i64, grace_period_days: i64) -> Result<Self, ConfigError> {
        Self::new(days(interval_days), days(grace_period_days))
    }

    /// Get rotation interval
    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// Get grace period
    pub fn grace_period(&self) -> TimeDelta {
        self.grace_period
    }

    /// Whether a new credential should be minted at `now`
    ///
    /// Due when nothing was ever minted, or at least one interval has passed
    /// since the last mint. A clock that moved backwards is never due.
    pub fn is_rotation_due(&self, last_rotation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_rotation {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.interval,
        }
    }

    /// Retirement time for a grace period starting at `start`
    pub fn retire_at(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start
            .checked_add_signed(self.grace_period)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether generations can pile up under [`RotationPolicy::Accumulate`]
    pub fn allows_overlapping_generations(&self) -> bool {
        self.grace_period >= self.interval
    }
}

impl Default for RotationSchedule {
    fn default() -> Self {
        Self {
            interval: days(30),
            grace_period: days(14),
        }
    }
}

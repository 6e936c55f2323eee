//! Rotation notification events
//!
//! One event per lifecycle transition that actually touched the live
//! credential set. [`NotificationEvent::description`] renders the Markdown
//! text sent to humans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::CredentialId;
use crate::rotation::{MintedCredential, RetiredCredential};

/// Notification event for the credential lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A credential was added to the proxy configuration
    CredentialAdded {
        /// New credential
        credential_id: CredentialId,

        /// When it was minted
        created_at: DateTime<Utc>,

        /// Scheduled removal: of the replaced credential when `replaces` is
        /// set, otherwise of the new credential itself
        retire_at: Option<DateTime<Utc>>,

        /// Credential being handed off from
        replaces: Option<CredentialId>,
    },

    /// A credential was removed from the proxy configuration
    CredentialRemoved {
        /// Removed credential
        credential_id: CredentialId,

        /// When it was removed
        removed_at: DateTime<Utc>,
    },
}

impl NotificationEvent {
    /// Event for a freshly minted credential
    pub fn added(minted: &MintedCredential) -> Self {
        match &minted.superseded {
            Some(previous) => NotificationEvent::CredentialAdded {
                credential_id: minted.id,
                created_at: minted.created_at,
                retire_at: Some(previous.retire_at),
                replaces: Some(previous.id),
            },
            None => NotificationEvent::CredentialAdded {
                credential_id: minted.id,
                created_at: minted.created_at,
                retire_at: minted.retire_at,
                replaces: None,
            },
        }
    }

    /// Event for a credential removed at `removed_at`
    pub fn removed(retired: &RetiredCredential, removed_at: DateTime<Utc>) -> Self {
        NotificationEvent::CredentialRemoved {
            credential_id: retired.id,
            removed_at,
        }
    }

    /// Get the credential ID associated with this event
    pub fn credential_id(&self) -> &CredentialId {
        match self {
            NotificationEvent::CredentialAdded { credential_id, .. } => credential_id,
            NotificationEvent::CredentialRemoved { credential_id, .. } => credential_id,
        }
    }

    /// Get the event timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            NotificationEvent::CredentialAdded { created_at, .. } => *created_at,
            NotificationEvent::CredentialRemoved { removed_at, .. } => *removed_at,
        }
    }

    /// Short machine-friendly kind
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::CredentialAdded { .. } => "credential_added",
            NotificationEvent::CredentialRemoved { .. } => "credential_removed",
        }
    }

    /// Get a human-readable event description (Telegram Markdown)
    pub fn description(&self) -> String {
        match self {
            NotificationEvent::CredentialAdded {
                credential_id,
                created_at,
                retire_at,
                replaces,
            } => {
                let mut msg = format!(
                    "🆕 *New UUID added*\n\n`{credential_id}`\n\n📅 Created (UTC): {}\n",
                    date(created_at)
                );
                match (replaces, retire_at) {
                    (Some(_), Some(at)) => {
                        msg.push_str(&format!("⏳ Old UUID will be removed (UTC): {}\n", date(at)));
                    }
                    (None, Some(at)) => {
                        msg.push_str(&format!("⏳ Removal date (UTC): {}\n", date(at)));
                    }
                    _ => {}
                }
                msg
            }
            NotificationEvent::CredentialRemoved {
                credential_id,
                removed_at,
            } => format!(
                "🗑 *UUID removed*\n\n`{credential_id}`\n📅 Removed (UTC): {}",
                date(removed_at)
            ),
        }
    }
}

fn date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PendingRemoval;
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;

    fn id(n: u128) -> CredentialId {
        CredentialId::from_uuid(uuid::Uuid::from_u128(n))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_added_with_handoff_mentions_old_credential() {
        let minted = MintedCredential {
            id: id(2),
            created_at: t0(),
            retire_at: None,
            superseded: Some(PendingRemoval {
                id: id(1),
                retire_at: t0() + TimeDelta::days(14),
            }),
        };

        let event = NotificationEvent::added(&minted);

        assert_eq!(
            event.description(),
            "🆕 *New UUID added*\n\n\
             `00000000-0000-0000-0000-000000000002`\n\n\
             📅 Created (UTC): 2025-03-01\n\
             ⏳ Old UUID will be removed (UTC): 2025-03-15\n"
        );
    }

    #[test]
    fn test_added_with_own_expiry() {
        let minted = MintedCredential {
            id: id(2),
            created_at: t0(),
            retire_at: Some(t0() + TimeDelta::days(14)),
            superseded: None,
        };

        let text = NotificationEvent::added(&minted).description();
        assert!(text.ends_with("⏳ Removal date (UTC): 2025-03-15\n"));
    }

    #[test]
    fn test_added_first_credential_has_no_removal_line() {
        let minted = MintedCredential {
            id: id(1),
            created_at: t0(),
            retire_at: None,
            superseded: None,
        };

        let text = NotificationEvent::added(&minted).description();
        assert!(!text.contains("⏳"));
    }

    #[test]
    fn test_removed_description() {
        let retired = RetiredCredential {
            id: id(1),
            created_at: None,
            retire_at: t0(),
        };

        let event = NotificationEvent::removed(&retired, t0() + TimeDelta::days(1));

        assert_eq!(event.credential_id(), &id(1));
        assert_eq!(event.kind(), "credential_removed");
        assert_eq!(
            event.description(),
            "🗑 *UUID removed*\n\n`00000000-0000-0000-0000-000000000001`\n📅 Removed (UTC): 2025-03-02"
        );
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = NotificationEvent::CredentialRemoved {
            credential_id: id(1),
            removed_at: t0(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "credential_removed");
    }
}

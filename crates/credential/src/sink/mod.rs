//! Apply/notify sinks
//!
//! The orchestrator talks to the outside world through two traits:
//! [`ReloadSignal`] (make the proxy pick up its new configuration) and
//! [`NotificationSender`] (tell a human what changed). Both are best-effort;
//! a [`SinkError`] is logged and counted but never aborts a run.
//!
//! # Example
//!
//! ```rust,ignore
//! use rotor_credential::sink::{NotificationEvent, NotificationSender};
//! use rotor_credential::SinkError;
//!
//! pub struct SlackNotifier {
//!     webhook_url: String,
//! }
//!
//! #[async_trait]
//! impl NotificationSender for SlackNotifier {
//!     async fn send(&self, event: &NotificationEvent) -> Result<(), SinkError> {
//!         let payload = json!({ "text": event.description() });
//!         reqwest::Client::new().post(&self.webhook_url).json(&payload).send().await?;
//!         Ok(())
//!     }
//! }
//! ```

mod events;
mod log;
mod reload;
#[cfg(feature = "telegram")]
mod telegram;

pub use events::NotificationEvent;
pub use log::LogNotifier;
pub use reload::{CommandReload, DEFAULT_RELOAD_TIMEOUT};
#[cfg(feature = "telegram")]
pub use telegram::{DEFAULT_API_BASE, TelegramNotifier};

use async_trait::async_trait;

use crate::core::SinkError;

/// Makes the proxy reload its configuration
#[async_trait]
pub trait ReloadSignal: Send + Sync {
    /// Trigger a reload and wait for it to finish
    async fn reload(&self) -> Result<(), SinkError>;
}

/// Delivers notification events
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send a notification event
    async fn send(&self, event: &NotificationEvent) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: ReloadSignal + ?Sized> ReloadSignal for Box<T> {
    async fn reload(&self) -> Result<(), SinkError> {
        (**self).reload().await
    }
}

#[async_trait]
impl<T: NotificationSender + ?Sized> NotificationSender for Box<T> {
    async fn send(&self, event: &NotificationEvent) -> Result<(), SinkError> {
        (**self).send(event).await
    }
}

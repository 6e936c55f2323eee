//! Telegram Bot API notifications

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::NotificationSender;
use super::events::NotificationEvent;
use crate::core::SinkError;

/// Default Bot API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const CHANNEL: &str = "telegram";

/// Sends events to a Telegram chat via `sendMessage`
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier for `chat_id` using `bot_token`
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| notify_error(&e))?;

        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Use a different Bot API server
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NotificationSender for TelegramNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), SinkError> {
        let text = event.description();
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text.as_str()),
            ("parse_mode", "Markdown"),
        ];

        // the request URL embeds the bot token
        let response = self
            .client
            .post(self.endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| notify_error(&e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Notify {
                channel: CHANNEL,
                reason: format!("HTTP {status}: {}", body.trim()),
            });
        }

        debug!(kind = event.kind(), credential_id = %event.credential_id(), "Telegram notification sent");
        Ok(())
    }
}

fn notify_error(err: &reqwest::Error) -> SinkError {
    SinkError::Notify {
        channel: CHANNEL,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CredentialId;
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> NotificationEvent {
        NotificationEvent::CredentialRemoved {
            credential_id: CredentialId::from_uuid(uuid::Uuid::from_u128(7)),
            removed_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn notifier(server: &MockServer) -> TelegramNotifier {
        TelegramNotifier::new("123:ABC", "-10042", Duration::from_secs(5))
            .unwrap()
            .with_api_base(server.uri())
    }

    #[tokio::test]
    async fn test_send_posts_form_to_bot_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendMessage"))
            .and(body_string_contains("chat_id=-10042"))
            .and(body_string_contains("parse_mode=Markdown"))
            .and(body_string_contains("00000000-0000-0000-0000-000000000007"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server).send(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_reports_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = notifier(&server).send(&event()).await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains("Unauthorized"), "{msg}");
    }

    #[tokio::test]
    async fn test_connection_error_does_not_leak_token() {
        let notifier = TelegramNotifier::new("123:SECRET", "1", Duration::from_secs(2))
            .unwrap()
            .with_api_base("http://127.0.0.1:1");

        let err = notifier.send(&event()).await.unwrap_err();
        assert!(!err.to_string().contains("SECRET"));
    }

    #[test]
    fn test_debug_hides_token() {
        let notifier = TelegramNotifier::new("123:SECRET", "1", Duration::from_secs(1)).unwrap();
        assert!(!format!("{notifier:?}").contains("SECRET"));
    }
}

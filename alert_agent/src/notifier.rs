use alert_engine::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use serde::Serialize;
use shared::error::FetchError;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Writes notifications to the log once their delay has elapsed.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: Notification) -> Result<(), NotifyError> {
        sleep(notification.delay).await;
        info!(
            name: "notification.delivered",
            title = %notification.title,
            body = %notification.body,
            "notification delivered"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    body: &'a str,
}

/// Posts notifications as JSON to a configured endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip_all, fields(url = %self.url))]
    async fn deliver(&self, notification: Notification) -> Result<(), NotifyError> {
        sleep(notification.delay).await;
        self.client
            .post(&self.url)
            .json(&WebhookPayload {
                title: &notification.title,
                body: &notification.body,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(FetchError::from)?;
        info!(name: "notification.webhook.delivered", body = %notification.body, "webhook notification delivered");
        Ok(())
    }
}

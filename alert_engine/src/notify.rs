use crate::providers::{Notification, Notifier};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const NOTIFICATION_TITLE: &str = "New Disaster Alert";
pub const DEFAULT_NOTIFICATION_DELAY: Duration = Duration::from_secs(1);

/// Gatekeeper in front of the notifier: each declaration title is announced at
/// most once for the life of the process.
///
/// The set of announced titles is append-only and never evicted. The timestamp
/// of the first announcement is kept alongside each title.
pub struct NotificationDeduplicator {
    notifier: Arc<dyn Notifier>,
    delay: Duration,
    announced: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl NotificationDeduplicator {
    pub fn new(notifier: Arc<dyn Notifier>, delay: Duration) -> Self {
        Self {
            notifier,
            delay,
            announced: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true when a notification was dispatched for `title`.
    ///
    /// Delivery runs detached. The title counts as announced once dispatch was
    /// attempted, even if delivery later fails. Must be called within a tokio runtime.
    pub fn announce_if_new(&self, title: &str) -> bool {
        let mut announced = self.announced.lock();
        if announced.contains_key(title) {
            debug!(name: "notify.duplicate", title, "declaration already announced");
            return false;
        }

        let notification = Notification {
            title: NOTIFICATION_TITLE.to_string(),
            body: title.to_string(),
            delay: self.delay,
        };
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let body = notification.body.clone();
            if let Err(e) = notifier.deliver(notification).await {
                warn!(
                    name: "notify.delivery.failed",
                    notifier = notifier.name(),
                    title = %body,
                    error = ?e,
                    "notification delivery failed"
                );
            }
        });

        announced.insert(title.to_string(), Utc::now());
        info!(name: "notify.dispatched", title, "dispatched notification for new declaration");
        true
    }

    pub fn contains(&self, title: &str) -> bool {
        self.announced.lock().contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.announced.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Announced titles, oldest first.
    pub fn announced(&self) -> Vec<String> {
        let mut entries: Vec<(String, DateTime<Utc>)> = self
            .announced
            .lock()
            .iter()
            .map(|(title, at)| (title.clone(), *at))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries.into_iter().map(|(title, _)| title).collect()
    }
}

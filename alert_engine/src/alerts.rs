use crate::error::LookupError;
use crate::health::ProviderHealth;
use crate::model::{AlertRecord, AlertState};
use crate::notify::NotificationDeduplicator;
use crate::providers::{AlertProvider, Declaration};
use crate::region::RegionCode;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of one alert refresh, mostly useful to callers that await it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertRefresh {
    Active { title: String, announced: bool },
    NoActiveAlert,
    Failed,
}

pub struct AlertFetcher {
    provider: Arc<dyn AlertProvider>,
    dedup: Arc<NotificationDeduplicator>,
    state: RwLock<AlertState>,
    health: ProviderHealth,
}

impl AlertFetcher {
    pub fn new(provider: Arc<dyn AlertProvider>, dedup: Arc<NotificationDeduplicator>) -> Self {
        Self {
            provider,
            dedup,
            state: RwLock::new(AlertState::Fetching),
            health: ProviderHealth::default(),
        }
    }

    /// Newest open declaration for `region`, if any. Does not touch alert state.
    pub async fn fetch_alert(&self, region: &RegionCode) -> Result<Option<AlertRecord>, LookupError> {
        let declarations = self.provider.open_declarations(region).await?;
        Ok(newest_declaration(declarations, region))
    }

    /// Fetch and apply: failures leave the alert state as it was, an empty result
    /// clears it, and a new declaration is handed to the deduplicator.
    #[instrument(skip_all, fields(region = %region))]
    pub async fn refresh(&self, region: &RegionCode) -> AlertRefresh {
        self.health.record_attempt();
        let record = match self.fetch_alert(region).await {
            Ok(record) => record,
            Err(e) => {
                warn!(name: "alerts.fetch.failed", error = ?e, "failed to fetch disaster declarations");
                self.health.record_failure(&e);
                return AlertRefresh::Failed;
            }
        };
        self.health.record_success();

        let Some(record) = record else {
            info!(name: "alerts.none_active", "no recent active disasters for region");
            *self.state.write() = AlertState::NoActiveAlert {
                region: region.clone(),
            };
            return AlertRefresh::NoActiveAlert;
        };

        info!(name: "alerts.active", title = %record.title, "active disaster declaration");
        let title = record.title.clone();
        *self.state.write() = AlertState::Active(record);
        let announced = self.dedup.announce_if_new(&title);
        AlertRefresh::Active { title, announced }
    }

    pub fn state(&self) -> AlertState {
        self.state.read().clone()
    }

    pub fn health(&self) -> &ProviderHealth {
        &self.health
    }
}

/// Only element 0 is considered. A first entry without a title reads as no alert.
fn newest_declaration(declarations: Vec<Declaration>, region: &RegionCode) -> Option<AlertRecord> {
    let first = declarations.into_iter().next()?;
    let title = first.title.filter(|t| !t.trim().is_empty())?;
    Some(AlertRecord {
        title,
        issued: first.issued,
        expires: first.expires,
        region: region.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::notify::DEFAULT_NOTIFICATION_DELAY;
    use crate::providers::{Notification, Notifier};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedAlerts {
        responses: Mutex<VecDeque<Result<Vec<Declaration>, LookupError>>>,
    }

    impl ScriptedAlerts {
        fn push(&self, response: Result<Vec<Declaration>, LookupError>) {
            self.responses.lock().push_back(response);
        }
    }

    #[async_trait]
    impl AlertProvider for ScriptedAlerts {
        async fn open_declarations(&self, _region: &RegionCode) -> Result<Vec<Declaration>, LookupError> {
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(LookupError::Unavailable("script exhausted".into())))
        }
    }

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        fn name(&self) -> &str {
            "silent"
        }

        async fn deliver(&self, _notification: Notification) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    fn declaration(title: &str) -> Declaration {
        Declaration {
            title: Some(title.to_string()),
            issued: Some("2024-09-20T00:00:00.000Z".into()),
            expires: None,
        }
    }

    fn fetcher() -> (AlertFetcher, Arc<ScriptedAlerts>, Arc<NotificationDeduplicator>) {
        let provider = Arc::new(ScriptedAlerts::default());
        let dedup = Arc::new(NotificationDeduplicator::new(
            Arc::new(SilentNotifier),
            DEFAULT_NOTIFICATION_DELAY,
        ));
        let fetcher = AlertFetcher::new(provider.clone(), Arc::clone(&dedup));
        (fetcher, provider, dedup)
    }

    fn ca() -> RegionCode {
        RegionCode::parse("CA").unwrap()
    }

    #[tokio::test]
    async fn takes_first_declaration_only() {
        let (fetcher, provider, dedup) = fetcher();
        provider.push(Ok(vec![declaration("Severe Storm DR-1234"), declaration("Older Fire")]));

        let outcome = fetcher.refresh(&ca()).await;
        assert_eq!(
            outcome,
            AlertRefresh::Active {
                title: "Severe Storm DR-1234".into(),
                announced: true
            }
        );
        let state = fetcher.state();
        let record = state.active().expect("active alert");
        assert_eq!(record.title, "Severe Storm DR-1234");
        assert_eq!(record.issued_display(), "2024-09-20T00:00:00.000Z");
        assert_eq!(record.expires_display(), "N/A");
        assert!(dedup.contains("Severe Storm DR-1234"));
        assert!(!dedup.contains("Older Fire"));
    }

    #[tokio::test]
    async fn empty_result_clears_alert_but_not_notified_set() {
        let (fetcher, provider, dedup) = fetcher();
        provider.push(Ok(vec![declaration("Severe Storm DR-1234")]));
        provider.push(Ok(vec![]));

        fetcher.refresh(&ca()).await;
        assert_eq!(fetcher.refresh(&ca()).await, AlertRefresh::NoActiveAlert);
        assert_eq!(fetcher.state(), AlertState::NoActiveAlert { region: ca() });
        assert!(dedup.contains("Severe Storm DR-1234"));
    }

    #[tokio::test]
    async fn empty_result_from_fresh_state_leaves_set_empty() {
        let (fetcher, provider, dedup) = fetcher();
        provider.push(Ok(vec![]));
        fetcher.refresh(&ca()).await;
        assert_eq!(
            fetcher.state().message(),
            "No recent active disasters reported for CA"
        );
        assert!(dedup.is_empty());
    }

    #[tokio::test]
    async fn failure_leaves_previous_state() {
        let (fetcher, provider, _dedup) = fetcher();
        provider.push(Ok(vec![declaration("Wildfire")]));
        provider.push(Err(LookupError::Unavailable("timeout".into())));

        fetcher.refresh(&ca()).await;
        let before = fetcher.state();
        assert_eq!(fetcher.refresh(&ca()).await, AlertRefresh::Failed);
        assert_eq!(fetcher.state(), before);
        assert!(fetcher.health().snapshot().is_failing());
    }

    #[tokio::test]
    async fn failure_before_any_success_keeps_fetching_placeholder() {
        let (fetcher, provider, _dedup) = fetcher();
        provider.push(Err(LookupError::MissingData("DisasterDeclarationsSummaries")));
        fetcher.refresh(&ca()).await;
        assert_eq!(fetcher.state(), AlertState::Fetching);
    }

    #[tokio::test]
    async fn repeated_title_is_not_reannounced() {
        let (fetcher, provider, dedup) = fetcher();
        provider.push(Ok(vec![declaration("Hurricane")]));
        provider.push(Ok(vec![declaration("Hurricane")]));

        fetcher.refresh(&ca()).await;
        let second = fetcher.refresh(&ca()).await;
        assert_eq!(
            second,
            AlertRefresh::Active {
                title: "Hurricane".into(),
                announced: false
            }
        );
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn untitled_first_declaration_reads_as_no_alert() {
        let declarations = vec![Declaration::default(), declaration("Ignored")];
        assert!(newest_declaration(declarations, &ca()).is_none());
    }
}

use crate::alerts::{AlertFetcher, AlertRefresh};
use crate::health::HealthSnapshot;
use crate::model::{AlertState, PlaceCategory, PlaceRecord, Position, ViewRegion};
use crate::notify::{DEFAULT_NOTIFICATION_DELAY, NotificationDeduplicator};
use crate::places::{DEFAULT_RADIUS_MILES, NearbyPlaceAggregator};
use crate::providers::{AlertProvider, Geocoder, Notifier, PlaceSearch, PositionSource};
use crate::region::{RegionCode, RegionResolver};
use crate::view::PlaceFilterView;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const FIX_CHANNEL_CAPACITY: usize = 16;

/// External services the engine talks to.
pub struct Collaborators {
    pub geocoder: Arc<dyn Geocoder>,
    pub alerts: Arc<dyn AlertProvider>,
    pub places: Arc<dyn PlaceSearch>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub radius_miles: f64,
    pub notification_delay: Duration,
    pub place_query_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius_miles: DEFAULT_RADIUS_MILES,
            notification_delay: DEFAULT_NOTIFICATION_DELAY,
            place_query_timeout: None,
        }
    }
}

impl EngineConfig {
    pub fn from_settings(config: &shared::Config) -> Self {
        Self {
            radius_miles: config.places.radius_miles,
            notification_delay: Duration::from_secs(config.notifications.delay_seconds),
            place_query_timeout: config.places.query_timeout_seconds.map(Duration::from_secs),
        }
    }
}

/// Handles for the two branches started by a fix. Dropping them does not cancel
/// the work.
pub struct FixTasks {
    pub alert: JoinHandle<Option<AlertRefresh>>,
    pub places: JoinHandle<bool>,
}

#[derive(Debug, Clone, Default)]
struct Session {
    position: Option<Position>,
    view_region: ViewRegion,
    region: Option<RegionCode>,
}

struct Inner {
    resolver: RegionResolver,
    fetcher: AlertFetcher,
    dedup: Arc<NotificationDeduplicator>,
    aggregator: NearbyPlaceAggregator,
    session: RwLock<Session>,
    view: RwLock<PlaceFilterView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvidersHealth {
    pub geocoder: HealthSnapshot,
    pub alerts: HealthSnapshot,
    pub places: HealthSnapshot,
}

impl ProvidersHealth {
    pub fn is_failing(&self) -> bool {
        self.geocoder.is_failing() || self.alerts.is_failing() || self.places.is_failing()
    }
}

/// Read model handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub position: Option<Position>,
    pub view_region: ViewRegion,
    pub locality: String,
    pub region: Option<RegionCode>,
    pub alert: AlertState,
    pub alert_message: String,
    pub announced: Vec<String>,
    pub enabled_categories: Vec<PlaceCategory>,
    pub places: Vec<PlaceRecord>,
    pub markers: Vec<PlaceRecord>,
    pub selected_place: Option<PlaceRecord>,
    pub health: ProvidersHealth,
}

/// Location-driven alert and nearby-place engine. Cheap to clone.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        let dedup = Arc::new(NotificationDeduplicator::new(
            collaborators.notifier,
            config.notification_delay,
        ));
        Self {
            inner: Arc::new(Inner {
                resolver: RegionResolver::new(collaborators.geocoder),
                fetcher: AlertFetcher::new(collaborators.alerts, Arc::clone(&dedup)),
                dedup,
                aggregator: NearbyPlaceAggregator::new(
                    collaborators.places,
                    config.radius_miles,
                    config.place_query_timeout,
                ),
                session: RwLock::new(Session::default()),
                view: RwLock::new(PlaceFilterView::default()),
            }),
        }
    }

    /// Ingests one position fix and starts both workflows for it.
    ///
    /// The region branch resolves the administrative region and then fetches
    /// alerts. The places branch runs one aggregation round over the recentred
    /// view. Neither waits on the other.
    pub fn on_fix(&self, position: Position) -> FixTasks {
        let view_region = ViewRegion::around(position);
        {
            let mut session = self.inner.session.write();
            session.position = Some(position);
            session.view_region = view_region;
        }
        self.inner.view.write().set_user_position(position);
        let sequence = self.inner.aggregator.begin_round();
        debug!(name: "engine.fix", latitude = position.latitude, longitude = position.longitude, sequence, "position fix received");

        let engine = self.clone();
        let alert = tokio::spawn(async move {
            let Some(region) = engine.inner.resolver.resolve(position).await else {
                return None;
            };
            engine.inner.session.write().region = Some(region.clone());
            Some(engine.inner.fetcher.refresh(&region).await)
        });

        let engine = self.clone();
        let places = tokio::spawn(async move {
            let Some(round) = engine
                .inner
                .aggregator
                .run_round(sequence, view_region, position)
                .await
            else {
                return false;
            };
            engine.inner.view.write().commit(round)
        });

        FixTasks { alert, places }
    }

    /// Fetches alerts for an explicitly chosen region instead of the resolved one.
    pub fn select_region(&self, region: RegionCode) -> JoinHandle<AlertRefresh> {
        info!(name: "engine.region.selected", region = %region, "region selected manually");
        self.inner.session.write().region = Some(region.clone());
        let engine = self.clone();
        tokio::spawn(async move { engine.inner.fetcher.refresh(&region).await })
    }

    /// Applies a user pan or zoom. The next fix recentres with the default span.
    pub fn set_view_region(&self, region: ViewRegion) {
        self.inner.session.write().view_region = region;
    }

    pub fn set_enabled_categories(&self, categories: impl IntoIterator<Item = PlaceCategory>) {
        self.inner.view.write().set_enabled(categories);
    }

    pub fn toggle_category(&self, category: PlaceCategory) -> bool {
        self.inner.view.write().toggle(category)
    }

    pub fn visible_places(&self) -> Vec<PlaceRecord> {
        self.inner.view.read().visible_places()
    }

    pub fn select_place(&self, id: Uuid) -> Option<PlaceRecord> {
        self.inner.view.write().select(id).cloned()
    }

    pub fn alert_state(&self) -> AlertState {
        self.inner.fetcher.state()
    }

    pub fn announced(&self) -> Vec<String> {
        self.inner.dedup.announced()
    }

    pub fn health(&self) -> ProvidersHealth {
        ProvidersHealth {
            geocoder: self.inner.resolver.health().snapshot(),
            alerts: self.inner.fetcher.health().snapshot(),
            places: self.inner.aggregator.health().snapshot(),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let session = self.inner.session.read().clone();
        let alert = self.inner.fetcher.state();
        let view = self.inner.view.read();
        EngineSnapshot {
            position: session.position,
            view_region: session.view_region,
            locality: self.inner.resolver.locality(),
            region: session.region,
            alert_message: alert.message(),
            alert,
            announced: self.inner.dedup.announced(),
            enabled_categories: view.enabled(),
            places: view.visible_places(),
            markers: view.map_markers(),
            selected_place: view.selected().cloned(),
            health: self.health(),
        }
    }

    /// Feeds fixes from `source` into [`Engine::on_fix`] until cancelled or the
    /// source hangs up. The source is started and stopped exactly once.
    #[instrument(skip_all)]
    pub async fn run(&self, source: &dyn PositionSource, token: CancellationToken) {
        let (tx, mut rx) = mpsc::channel(FIX_CHANNEL_CAPACITY);
        source.start(tx);
        info!(name: "engine.started", "position updates started");

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                fix = rx.recv() => match fix {
                    Some(position) => {
                        self.on_fix(position);
                    }
                    None => {
                        info!(name: "engine.source.closed", "position source closed");
                        break;
                    }
                },
            }
        }

        source.stop();
        info!(name: "engine.stopped", "position updates stopped");
    }
}

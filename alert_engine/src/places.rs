//! Nearby-place aggregation: one search per category, all issued at once and
//! joined before anything is produced.

use crate::error::LookupError;
use crate::health::ProviderHealth;
use crate::model::{Bounds, PlaceCategory, PlaceRecord, Position, ViewRegion};
use crate::providers::{PlaceItem, PlaceSearch};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const DEFAULT_RADIUS_MILES: f64 = 5.0;

/// Output of one fan-out/fan-in round, tagged with its dispatch sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub sequence: u64,
    pub places: Vec<PlaceRecord>,
}

pub struct NearbyPlaceAggregator {
    search: Arc<dyn PlaceSearch>,
    radius_miles: f64,
    query_timeout: Option<Duration>,
    last_sequence: AtomicU64,
    health: ProviderHealth,
}

impl NearbyPlaceAggregator {
    pub fn new(
        search: Arc<dyn PlaceSearch>,
        radius_miles: f64,
        query_timeout: Option<Duration>,
    ) -> Self {
        Self {
            search,
            radius_miles,
            query_timeout,
            last_sequence: AtomicU64::new(0),
            health: ProviderHealth::default(),
        }
    }

    /// Reserves the next round number. Call at dispatch time, before spawning.
    pub fn begin_round(&self) -> u64 {
        self.last_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn search(&self, region: ViewRegion, origin: Position) -> Option<Round> {
        let sequence = self.begin_round();
        self.run_round(sequence, region, origin).await
    }

    /// Runs a previously reserved round. `None` when every category query failed,
    /// in which case the previous output should stay in place.
    #[instrument(skip(self, region, origin))]
    pub async fn run_round(&self, sequence: u64, region: ViewRegion, origin: Position) -> Option<Round> {
        self.health.record_attempt();
        let bounds = region.bounds();
        let queries = PlaceCategory::ALL.map(|category| self.query(category, bounds));
        let results = join_all(queries).await;

        let mut per_category = Vec::with_capacity(PlaceCategory::ALL.len());
        let mut failures = 0;
        for (category, result) in PlaceCategory::ALL.into_iter().zip(results) {
            match result {
                Ok(items) => {
                    debug!(name: "places.query.completed", %category, count = items.len(), "category query completed");
                    per_category.push((category, items));
                }
                Err(e) => {
                    warn!(name: "places.query.failed", %category, error = ?e, "category query failed");
                    self.health.record_failure(&e);
                    failures += 1;
                }
            }
        }

        if failures == PlaceCategory::ALL.len() {
            warn!(name: "places.round.discarded", sequence, "every category query failed, keeping previous results");
            return None;
        }
        self.health.record_success();

        let places = collect_round(origin, self.radius_miles, per_category);
        info!(name: "places.round.completed", sequence, count = places.len(), "nearby place round completed");
        Some(Round { sequence, places })
    }

    async fn query(&self, category: PlaceCategory, bounds: Bounds) -> Result<Vec<PlaceItem>, LookupError> {
        let search = self.search.search(category.query_term(), bounds);
        match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, search)
                .await
                .unwrap_or(Err(LookupError::TimedOut(limit))),
            None => search.await,
        }
    }

    pub fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    pub fn health(&self) -> &ProviderHealth {
        &self.health
    }
}

/// Tags, measures, radius-filters, concatenates in category order and stable-sorts
/// by distance.
pub fn collect_round(
    origin: Position,
    radius_miles: f64,
    results: Vec<(PlaceCategory, Vec<PlaceItem>)>,
) -> Vec<PlaceRecord> {
    let mut places: Vec<PlaceRecord> = results
        .into_iter()
        .flat_map(|(category, items)| items.into_iter().map(move |item| (category, item)))
        .filter_map(|(category, item)| {
            let distance_miles = origin.distance_miles(item.coordinate);
            (distance_miles <= radius_miles).then(|| PlaceRecord {
                id: Uuid::now_v7(),
                name: item.name,
                coordinate: item.coordinate,
                category: Some(category),
                address: item.address,
                phone: item.phone,
                distance_miles,
                is_user_marker: false,
            })
        })
        .collect();
    places.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    places
}

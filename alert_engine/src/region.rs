use crate::health::ProviderHealth;
use crate::model::Position;
use crate::providers::Geocoder;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_LOCALITY: &str = "Your Location";

const US_STATES: [(&str, &str); 50] = [
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// Two-letter administrative region code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RegionCode(String);

impl RegionCode {
    /// Accepts a two-letter code in any case or a US state name.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() == 2 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return Some(Self(raw.to_ascii_uppercase()));
        }
        US_STATES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(raw))
            .map(|(_, code)| Self((*code).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn state_name(&self) -> Option<&'static str> {
        US_STATES
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(name, _)| *name)
    }
}

impl Display for RegionCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct RegionResolver {
    geocoder: Arc<dyn Geocoder>,
    locality: RwLock<Option<String>>,
    health: ProviderHealth,
}

impl RegionResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            locality: RwLock::new(None),
            health: ProviderHealth::default(),
        }
    }

    /// Single request, no retry. Failures are logged and yield `None`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, position: Position) -> Option<RegionCode> {
        self.health.record_attempt();
        let placemark = match self.geocoder.reverse_geocode(position).await {
            Ok(placemark) => placemark,
            Err(e) => {
                warn!(name: "region.resolve.failed", error = ?e, "reverse geocoding failed");
                self.health.record_failure(&e);
                return None;
            }
        };
        self.health.record_success();
        self.locality.write().clone_from(&placemark.locality);

        let Some(area) = placemark.administrative_area.as_deref() else {
            debug!(name: "region.resolve.no_area", "placemark has no administrative area");
            return None;
        };
        match RegionCode::parse(area) {
            Some(code) => {
                info!(name: "region.resolved", region = %code, "resolved administrative region");
                Some(code)
            }
            None => {
                warn!(name: "region.resolve.unrecognized", area, "unrecognized administrative area");
                None
            }
        }
    }

    pub fn locality(&self) -> String {
        self.locality
            .read()
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCALITY.to_string())
    }

    pub fn health(&self) -> &ProviderHealth {
        &self.health
    }
}

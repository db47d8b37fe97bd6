use crate::geo;
use crate::region::RegionCode;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn distance_miles(self, other: Position) -> f64 {
        geo::distance_miles(self, other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

pub const DEFAULT_SPAN: Span = Span {
    latitude_delta: 0.05,
    longitude_delta: 0.05,
};

/// Map center shown before the first fix arrives.
pub const DEFAULT_CENTER: Position = Position::new(37.7749, -122.4194);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRegion {
    pub center: Position,
    pub span: Span,
}

impl Default for ViewRegion {
    fn default() -> Self {
        Self::around(DEFAULT_CENTER)
    }
}

impl ViewRegion {
    /// Region centred on `center` with the fixed default span.
    pub const fn around(center: Position) -> Self {
        Self {
            center,
            span: DEFAULT_SPAN,
        }
    }

    #[must_use]
    pub fn panned_to(self, center: Position) -> Self {
        Self { center, ..self }
    }

    /// Factors above 1 zoom out, below 1 zoom in.
    #[must_use]
    pub fn zoomed(self, factor: f64) -> Self {
        let factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            1.0
        };
        Self {
            center: self.center,
            span: Span {
                latitude_delta: (self.span.latitude_delta * factor).min(180.0),
                longitude_delta: (self.span.longitude_delta * factor).min(360.0),
            },
        }
    }

    pub fn bounds(&self) -> Bounds {
        let half_lat = self.span.latitude_delta / 2.0;
        let half_lon = self.span.longitude_delta / 2.0;
        Bounds {
            south: (self.center.latitude - half_lat).max(-90.0),
            west: self.center.longitude - half_lon,
            north: (self.center.latitude + half_lat).min(90.0),
            east: self.center.longitude + half_lon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Shelter,
    Police,
    FireStation,
    Hospital,
}

impl PlaceCategory {
    /// Query issue order. Ties in distance keep this order.
    pub const ALL: [PlaceCategory; 4] = [
        PlaceCategory::Shelter,
        PlaceCategory::Police,
        PlaceCategory::FireStation,
        PlaceCategory::Hospital,
    ];

    pub const fn glyph(self) -> &'static str {
        match self {
            PlaceCategory::Shelter => "🏠",
            PlaceCategory::Police => "🚓",
            PlaceCategory::FireStation => "🚒",
            PlaceCategory::Hospital => "🏥",
        }
    }

    pub const fn query_term(self) -> &'static str {
        match self {
            PlaceCategory::Shelter => "emergency shelter",
            PlaceCategory::Police => "police station",
            PlaceCategory::FireStation => "fire station",
            PlaceCategory::Hospital => "hospital",
        }
    }
}

impl Display for PlaceCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceCategory::Shelter => write!(f, "Shelter"),
            PlaceCategory::Police => write!(f, "Police"),
            PlaceCategory::FireStation => write!(f, "Fire Station"),
            PlaceCategory::Hospital => write!(f, "Hospital"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceRecord {
    pub id: Uuid,
    pub name: String,
    pub coordinate: Position,
    /// `None` only for the synthetic user marker.
    pub category: Option<PlaceCategory>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub distance_miles: f64,
    pub is_user_marker: bool,
}

impl PlaceRecord {
    pub fn user_marker(position: Position) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: "Your Location".to_string(),
            coordinate: position,
            category: None,
            address: None,
            phone: None,
            distance_miles: 0.0,
            is_user_marker: true,
        }
    }

    pub fn glyph(&self) -> &'static str {
        self.category.map_or("📍", PlaceCategory::glyph)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRecord {
    pub title: String,
    pub issued: Option<String>,
    pub expires: Option<String>,
    pub region: RegionCode,
}

impl AlertRecord {
    pub fn issued_display(&self) -> &str {
        self.issued.as_deref().unwrap_or("N/A")
    }

    pub fn expires_display(&self) -> &str {
        self.expires.as_deref().unwrap_or("N/A")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertState {
    #[default]
    Fetching,
    Active(AlertRecord),
    NoActiveAlert { region: RegionCode },
}

impl AlertState {
    pub fn active(&self) -> Option<&AlertRecord> {
        match self {
            AlertState::Active(record) => Some(record),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AlertState::Fetching => "Fetching alerts...".to_string(),
            AlertState::Active(record) => {
                format!("Alert: {} is ongoing in {}", record.title, record.region)
            }
            AlertState::NoActiveAlert { region } => {
                format!("No recent active disasters reported for {region}")
            }
        }
    }
}

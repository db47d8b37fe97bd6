use crate::error::FetchError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverseResponse {
    pub display_name: Option<String>,
    pub address: Option<Address>,
    /// Set instead of `address` when nothing could be geocoded.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "ISO3166-2-lvl4")]
    pub iso3166_2_lvl4: Option<String>,
    pub country_code: Option<String>,
}

impl Address {
    pub fn locality(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.hamlet.as_deref())
    }

    /// Subdivision part of the ISO 3166-2 code, e.g. `CA` for `US-CA`.
    pub fn subdivision_code(&self) -> Option<&str> {
        self.iso3166_2_lvl4
            .as_deref()
            .and_then(|code| code.split_once('-'))
            .map(|(_, subdivision)| subdivision)
            .filter(|subdivision| !subdivision.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub name: Option<String>,
    pub display_name: String,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub extratags: Option<HashMap<String, String>>,
}

impl SearchItem {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.lat.parse::<f64>().ok()?;
        let lon = self.lon.parse::<f64>().ok()?;
        Some((lat, lon))
    }

    pub fn phone(&self) -> Option<&str> {
        let tags = self.extratags.as_ref()?;
        tags.get("phone")
            .or_else(|| tags.get("contact:phone"))
            .map(String::as_str)
    }

    /// Falls back to the first component of the display name for unnamed features.
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self
                .display_name
                .split(',')
                .next()
                .map_or(self.display_name.as_str(), str::trim),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl ViewBox {
    fn to_query_value(self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    results_per_query: u32,
}

impl NominatimClient {
    pub fn new_with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            results_per_query: 20,
        }
    }

    #[must_use]
    pub fn with_results_per_query(mut self, limit: u32) -> Self {
        self.results_per_query = limit;
        self
    }

    #[instrument(skip(self))]
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseResponse, FetchError> {
        let body = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self))]
    pub async fn search(&self, term: &str, view_box: ViewBox) -> Result<Vec<SearchItem>, FetchError> {
        let body = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", term.to_string()),
                ("format", "jsonv2".to_string()),
                ("viewbox", view_box.to_query_value()),
                ("bounded", "1".to_string()),
                ("extratags", "1".to_string()),
                ("limit", self.results_per_query.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let items: Vec<SearchItem> = serde_json::from_str(&body)?;
        debug!(name: "nominatim.search.received", term, count = items.len(), "received search results");
        Ok(items)
    }
}

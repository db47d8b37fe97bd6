//! Provider trait implementations over the HTTP clients in `shared`.

use crate::error::LookupError;
use crate::model::{Bounds, Position};
use crate::providers::{AlertProvider, Declaration, Geocoder, PlaceItem, PlaceSearch, Placemark};
use crate::region::RegionCode;
use async_trait::async_trait;
use shared::fema::FemaClient;
use shared::nominatim::{NominatimClient, ViewBox};
use tracing::debug;

#[async_trait]
impl AlertProvider for FemaClient {
    async fn open_declarations(&self, region: &RegionCode) -> Result<Vec<Declaration>, LookupError> {
        let response = FemaClient::open_declarations(self, region.as_str()).await?;
        Ok(response
            .summaries
            .into_iter()
            .map(|summary| Declaration {
                title: summary.declaration_title,
                issued: summary.declaration_date,
                expires: summary.expiration_date,
            })
            .collect())
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn reverse_geocode(&self, position: Position) -> Result<Placemark, LookupError> {
        let response = self.reverse(position.latitude, position.longitude).await?;
        if let Some(reason) = response.error {
            return Err(LookupError::Unavailable(reason));
        }
        let address = response.address.ok_or(LookupError::MissingData("address"))?;
        Ok(Placemark {
            locality: address.locality().map(str::to_string),
            administrative_area: address
                .subdivision_code()
                .or(address.state.as_deref())
                .map(str::to_string),
        })
    }
}

#[async_trait]
impl PlaceSearch for NominatimClient {
    async fn search(&self, term: &str, bounds: Bounds) -> Result<Vec<PlaceItem>, LookupError> {
        let view_box = ViewBox {
            west: bounds.west,
            south: bounds.south,
            east: bounds.east,
            north: bounds.north,
        };
        let items = NominatimClient::search(self, term, view_box).await?;
        Ok(items
            .into_iter()
            .filter_map(|item| {
                let Some((latitude, longitude)) = item.coordinates() else {
                    debug!(name: "places.item.skipped", label = item.label(), "search item has unparseable coordinates");
                    return None;
                };
                Some(PlaceItem {
                    name: item.label().to_string(),
                    coordinate: Position::new(latitude, longitude),
                    phone: item.phone().map(str::to_string),
                    address: Some(item.display_name),
                })
            })
            .collect())
    }
}

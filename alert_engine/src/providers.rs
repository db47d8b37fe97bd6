//! Collaborator seams. Every external service the engine talks to is injected
//! through one of these traits.

use crate::error::{LookupError, NotifyError};
use crate::model::{Bounds, Position};
use crate::region::RegionCode;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placemark {
    pub locality: Option<String>,
    pub administrative_area: Option<String>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, position: Position) -> Result<Placemark, LookupError>;
}

/// One declaration as returned by the alert provider, newest incident first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    pub title: Option<String>,
    pub issued: Option<String>,
    pub expires: Option<String>,
}

#[async_trait]
pub trait AlertProvider: Send + Sync {
    async fn open_declarations(&self, region: &RegionCode) -> Result<Vec<Declaration>, LookupError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceItem {
    pub name: String,
    pub coordinate: Position,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, term: &str, bounds: Bounds) -> Result<Vec<PlaceItem>, LookupError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Delivery is scheduled this long after dispatch and never repeats.
    pub delay: Duration,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Push source of position fixes. Started and stopped once by [`crate::Engine::run`].
pub trait PositionSource: Send + Sync {
    fn start(&self, fixes: mpsc::Sender<Position>);

    fn stop(&self);
}

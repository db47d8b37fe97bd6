//! Location-driven disaster alerts and nearby emergency resources.
//!
//! Each position fix starts two independent workflows: region resolution followed
//! by an alert fetch, and a concurrent nearby-place search. See [`Engine`].

pub mod alerts;
pub mod engine;
pub mod error;
pub mod geo;
pub mod health;
pub mod http;
pub mod model;
pub mod notify;
pub mod places;
pub mod providers;
pub mod region;
pub mod view;

pub use engine::{Collaborators, Engine, EngineConfig, EngineSnapshot, FixTasks, ProvidersHealth};
pub use error::{FailureKind, LookupError, NotifyError};
pub use model::{
    AlertRecord, AlertState, Bounds, PlaceCategory, PlaceRecord, Position, Span, ViewRegion,
};
pub use providers::{
    AlertProvider, Declaration, Geocoder, Notification, Notifier, PlaceItem, PlaceSearch,
    Placemark, PositionSource,
};
pub use region::RegionCode;

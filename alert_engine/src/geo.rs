//! Great-circle distance helpers.

use crate::model::Position;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
pub const METERS_PER_MILE: f64 = 1_609.344;

/// Haversine distance between two positions, in meters.
pub fn distance_meters(from: Position, to: Position) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

pub fn distance_miles(from: Position, to: Position) -> f64 {
    distance_meters(from, to) / METERS_PER_MILE
}

/// Position `miles` due north of `origin`. Used to lay out fixtures at known distances.
pub fn offset_north(origin: Position, miles: f64) -> Position {
    let delta_degrees = (miles * METERS_PER_MILE / EARTH_RADIUS_METERS).to_degrees();
    Position::new(origin.latitude + delta_degrees, origin.longitude)
}

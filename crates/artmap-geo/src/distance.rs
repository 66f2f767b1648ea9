//! Great-circle distance and degree/meter conversion

use artmap_core::models::Coordinate;

/// Mean Earth radius used for every distance computation
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Approximate length of one degree, not corrected for latitude
pub const DEGREES_TO_METERS: f64 = 111_320.0;

/// Largest meaningful circle radius
pub const EARTH_CIRCUMFERENCE_METERS: f64 = 40_075_000.0;

/// Haversine distance in meters between two lat/lng pairs.
///
/// Uses the `atan2` form with the haversine term clamped to `[0, 1]`, which
/// keeps near-antipodal pairs finite.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Distance between two coordinates in meters
pub fn coordinate_distance(a: Coordinate, b: Coordinate) -> f64 {
    distance_meters(a.lat, a.lng, b.lat, b.lng)
}

pub fn degrees_to_meters(degrees: f64) -> f64 {
    degrees * DEGREES_TO_METERS
}

pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / DEGREES_TO_METERS
}

/// Convert a coordinate to a `geo` point (x = longitude, y = latitude)
pub fn to_point(coordinate: Coordinate) -> geo::Point<f64> {
    geo::Point::new(coordinate.lng, coordinate.lat)
}

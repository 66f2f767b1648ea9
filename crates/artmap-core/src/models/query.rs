use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Artifact;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned latitude/longitude rectangle.
///
/// `north >= south` is checked by callers. `east < west` (a box crossing
/// the antimeridian) is not supported and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self { north, south, east, west }
    }

    /// The whole coordinate space
    pub fn world() -> Self {
        Self::new(90.0, -90.0, 180.0, -180.0)
    }

    /// Closed-interval containment, boundary points included
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }
}

/// Center point plus radius in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleSelection {
    pub center: Coordinate,
    pub radius: f64,
}

impl CircleSelection {
    pub fn new(lat: f64, lng: f64, radius: f64) -> Self {
        Self { center: Coordinate::new(lat, lng), radius }
    }
}

/// Category tally over a circle selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub count: usize,

    /// Matches per category; categories without matches are absent
    pub categories: BTreeMap<String, usize>,

    pub artifacts: Vec<Artifact>,
}

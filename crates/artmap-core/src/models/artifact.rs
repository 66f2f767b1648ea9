use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::query::Coordinate;

/// Layer assigned to artifacts inserted without one
pub const DEFAULT_LAYER: &str = "default";

/// Unique identifier for an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ArtifactId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A geotagged point record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Unique identifier
    pub id: ArtifactId,

    /// Display name
    pub name: String,

    /// Category used for aggregation
    pub category: String,

    /// Layer partition the artifact belongs to
    pub layer: String,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lng: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// When the artifact was created
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Position of the artifact
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Artifact as supplied by a caller, before id and defaults are assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertArtifact {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub layer: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl InsertArtifact {
    /// Create an insert request with the required fields
    pub fn new(name: impl Into<String>, category: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            layer: None,
            lat,
            lng,
            description: None,
            metadata: None,
            created_at: None,
        }
    }

    /// Place the artifact in a layer
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Layer this insert will land in once defaults are applied
    pub fn layer_id(&self) -> &str {
        self.layer.as_deref().unwrap_or(DEFAULT_LAYER)
    }

    /// Materialize the artifact, filling in the layer and creation time defaults
    pub fn into_artifact(self, id: ArtifactId) -> Artifact {
        let layer = self.layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        Artifact {
            id,
            name: self.name,
            category: self.category,
            layer,
            lat: self.lat,
            lng: self.lng,
            description: self.description,
            metadata: self.metadata,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

use serde::{Deserialize, Serialize};

use super::Artifact;

/// Synthetic point summarizing a dense grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterData {
    /// `cluster-<x>:<y>` derived from the grid cell
    pub id: String,
    /// Mean latitude of the members
    pub lat: f64,
    /// Mean longitude of the members
    pub lng: f64,
    pub count: usize,
}

/// Result of a bounds + zoom + limit query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewportResponse {
    pub clusters: Vec<ClusterData>,
    pub singles: Vec<Artifact>,
    /// Artifacts matching the bounds before truncation
    pub total: usize,
    pub truncated: bool,
}

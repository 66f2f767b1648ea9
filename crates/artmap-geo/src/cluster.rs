//! Zoom-adaptive grid clustering for viewport queries.
//!
//! Stateless: every function here is a transform over the artifacts a
//! bounds query returned. Persisted backends compute the same cells with
//! `floor(coord / grid_size)` and feed their rows through [`cluster_from_cell`]
//! and [`apply_limit`] so both backends produce identical responses.

use std::collections::BTreeMap;

use artmap_core::models::{Artifact, ClusterData, ViewportResponse};

use crate::distance::degrees_to_meters;

/// At or above this zoom artifacts are returned individually
pub const CLUSTERING_MAX_ZOOM: u8 = 13;

/// A cell needs more than this many members to become a cluster
pub const CLUSTER_THRESHOLD: usize = 3;

/// Grid cell edge length in degrees for a zoom level
pub fn grid_size(zoom: u8) -> f64 {
    match zoom {
        0..=6 => 2.0,
        7..=8 => 1.0,
        9..=10 => 0.5,
        11..=12 => 0.1,
        _ => 0.05,
    }
}

/// Grid cell coordinates: `(floor(lng / grid), floor(lat / grid))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridCell {
    pub x: i64,
    pub y: i64,
}

impl GridCell {
    pub fn of(lat: f64, lng: f64, grid_size: f64) -> Self {
        Self {
            x: (lng / grid_size).floor() as i64,
            y: (lat / grid_size).floor() as i64,
        }
    }

    /// `<x>:<y>`
    pub fn key(&self) -> String {
        format!("{}:{}", self.x, self.y)
    }

    pub fn cluster_id(&self) -> String {
        format!("cluster-{}", self.key())
    }
}

/// Cluster for a cell whose members have already been counted and averaged
pub fn cluster_from_cell(cell: GridCell, count: usize, lat: f64, lng: f64) -> ClusterData {
    ClusterData { id: cell.cluster_id(), lat, lng, count }
}

/// Reduce a bounds query result to clusters and singles under `limit`.
///
/// Below [`CLUSTERING_MAX_ZOOM`] artifacts are bucketed per grid cell; cells
/// with more than [`CLUSTER_THRESHOLD`] members collapse into one cluster at
/// their mean position. Clusters come out in cell order, singles in cell
/// order then by id. At high zoom every artifact is a single, ordered by id.
pub fn cluster_viewport(mut artifacts: Vec<Artifact>, zoom: u8, limit: usize) -> ViewportResponse {
    let total = artifacts.len();

    if zoom >= CLUSTERING_MAX_ZOOM {
        artifacts.sort_by_key(|a| a.id);
        return apply_limit(Vec::new(), artifacts, total, limit);
    }

    let grid = grid_size(zoom);
    tracing::debug!(
        zoom,
        grid_size = grid,
        cell_meters = degrees_to_meters(grid),
        candidates = total,
        "Clustering viewport"
    );

    let mut cells: BTreeMap<GridCell, Vec<Artifact>> = BTreeMap::new();
    for artifact in artifacts {
        cells.entry(GridCell::of(artifact.lat, artifact.lng, grid)).or_default().push(artifact);
    }

    let mut clusters = Vec::new();
    let mut singles = Vec::new();
    for (cell, mut members) in cells {
        if members.len() > CLUSTER_THRESHOLD {
            let n = members.len() as f64;
            let lat = members.iter().map(|a| a.lat).sum::<f64>() / n;
            let lng = members.iter().map(|a| a.lng).sum::<f64>() / n;
            clusters.push(cluster_from_cell(cell, members.len(), lat, lng));
        } else {
            members.sort_by_key(|a| a.id);
            singles.extend(members);
        }
    }

    apply_limit(clusters, singles, total, limit)
}

/// Truncate to `limit` items, keeping clusters ahead of singles.
///
/// If clusters alone exceed the limit, only the first `limit` clusters are
/// kept and every single is dropped.
pub fn apply_limit(
    mut clusters: Vec<ClusterData>,
    mut singles: Vec<Artifact>,
    total: usize,
    limit: usize,
) -> ViewportResponse {
    let truncated = clusters.len() + singles.len() > limit;

    if truncated {
        if clusters.len() <= limit {
            singles.truncate(limit - clusters.len());
        } else {
            clusters.truncate(limit);
            singles.clear();
        }
    }

    ViewportResponse { clusters, singles, total, truncated }
}

//! Row mapping and query-shaping helpers shared by the SQL operations

use artmap_core::error::{ArtmapError, Result};
use artmap_core::models::{
    Artifact, ArtifactId, Bounds, ClusterData, Layer, LayerFilter, ViewportResponse,
};
use artmap_geo::{cluster_from_cell, is_valid_coordinate, GridCell, CLUSTER_THRESHOLD};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use std::collections::HashMap;
use uuid::Uuid;

/// Column list matching [`artifact_from_row`]
pub(super) const ARTIFACT_COLUMNS: &str =
    "id, name, category, layer, lat, lng, description, metadata, created_at";

/// Column list matching [`layer_from_row`]
pub(super) const LAYER_COLUMNS: &str =
    "id, name, description, source, artifact_count, visible, style";

pub(super) fn artifact_from_row(row: &PgRow) -> Result<Artifact> {
    let decode = |e: sqlx::Error| ArtmapError::Serialization(format!("Bad artifact row: {}", e));

    let metadata: Option<Json<HashMap<String, Value>>> = row.try_get("metadata").map_err(decode)?;

    Ok(Artifact {
        id: ArtifactId(row.try_get::<Uuid, _>("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        layer: row.try_get("layer").map_err(decode)?,
        lat: row.try_get("lat").map_err(decode)?,
        lng: row.try_get("lng").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        metadata: metadata.map(|Json(m)| m),
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

pub(super) fn layer_from_row(row: &PgRow) -> Result<Layer> {
    let decode = |e: sqlx::Error| ArtmapError::Serialization(format!("Bad layer row: {}", e));

    let artifact_count: i64 = row.try_get("artifact_count").map_err(decode)?;

    Ok(Layer {
        id: row.try_get("id").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        source: row.try_get("source").map_err(decode)?,
        artifact_count: count_from_db(artifact_count),
        visible: row.try_get("visible").map_err(decode)?,
        style: row.try_get("style").map_err(decode)?,
    })
}

pub(super) fn count_from_db(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}

pub(super) fn limit_to_db(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Layer ids bound as a `text[]`, NULL meaning every layer
pub(super) fn layer_param(layers: &LayerFilter) -> Option<Vec<String>> {
    layers.layer_ids().map(<[String]>::to_vec)
}

/// Bounds that can match nothing: inverted (including antimeridian-crossing)
/// or NaN edges. Checked before any SQL is issued.
pub(super) fn is_empty_bounds(bounds: &Bounds) -> bool {
    !(bounds.west <= bounds.east && bounds.south <= bounds.north)
}

/// Location column value: NULL for coordinates that must stay out of the index
pub(super) fn location_param(lat: f64, lng: f64) -> (Option<f64>, Option<f64>) {
    if is_valid_coordinate(lat, lng) {
        (Some(lng), Some(lat))
    } else {
        (None, None)
    }
}

/// One `GROUP BY` row of the viewport grid aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct CellRow {
    pub cell: GridCell,
    pub count: usize,
    pub lat: f64,
    pub lng: f64,
}

/// Grid aggregation split into cluster cells and the number of single artifacts
#[derive(Debug, Default, PartialEq)]
pub(super) struct CellSummary {
    pub clusters: Vec<ClusterData>,
    pub single_count: usize,
    pub total: usize,
}

/// Cells arrive ordered by `(x, y)`, so clusters keep that order
pub(super) fn summarize_cells(cells: impl IntoIterator<Item = CellRow>) -> CellSummary {
    let mut summary = CellSummary::default();
    for row in cells {
        summary.total += row.count;
        if row.count > CLUSTER_THRESHOLD {
            summary.clusters.push(cluster_from_cell(row.cell, row.count, row.lat, row.lng));
        } else {
            summary.single_count += row.count;
        }
    }
    summary
}

/// How many singles to fetch after clusters have taken their share of `limit`
pub(super) fn singles_budget(summary: &CellSummary, limit: usize) -> usize {
    limit.saturating_sub(summary.clusters.len()).min(summary.single_count)
}

/// Final response from the cell summary and the singles fetched under budget
pub(super) fn viewport_from_summary(
    mut summary: CellSummary,
    singles: Vec<Artifact>,
    limit: usize,
) -> ViewportResponse {
    let truncated = summary.clusters.len() + summary.single_count > limit;
    summary.clusters.truncate(limit);

    ViewportResponse { clusters: summary.clusters, singles, total: summary.total, truncated }
}

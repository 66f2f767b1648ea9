use artmap_core::models::{Artifact, ArtifactId};
use rstar::{RTree, RTreeObject, AABB};

use crate::validation::is_valid_coordinate;

/// Artifact position stored in the index.
///
/// Holds the id only; results are materialized from the owning store's map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint {
    pub id: ArtifactId,
    pub lat: f64,
    pub lng: f64,
}

impl IndexedPoint {
    pub fn new(id: ArtifactId, lat: f64, lng: f64) -> Self {
        Self { id, lat, lng }
    }

    /// Out-of-range or non-finite coordinates never enter the tree
    pub fn is_indexable(&self) -> bool {
        is_valid_coordinate(self.lat, self.lng)
    }
}

impl From<&Artifact> for IndexedPoint {
    fn from(artifact: &Artifact) -> Self {
        Self::new(artifact.id, artifact.lat, artifact.lng)
    }
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

/// Bounding-box index over artifact positions.
///
/// Built in one pass with [`SpatialIndex::bulk_load`] and extended with
/// [`SpatialIndex::insert`]. There is no removal; callers rebuild instead.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    /// Create a new empty spatial index
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build an index from a collection of points
    pub fn from_points(points: Vec<IndexedPoint>) -> Self {
        let (indexable, skipped): (Vec<_>, Vec<_>) =
            points.into_iter().partition(IndexedPoint::is_indexable);

        if !skipped.is_empty() {
            tracing::warn!(skipped = skipped.len(), "Skipping points with invalid coordinates");
        }

        Self { tree: RTree::bulk_load(indexable) }
    }

    /// Replace the index contents in one pass
    pub fn bulk_load(&mut self, points: Vec<IndexedPoint>) {
        *self = Self::from_points(points);
    }

    /// Add one point without rebuilding.
    ///
    /// Returns `false` if the point has invalid coordinates and was not indexed.
    pub fn insert(&mut self, point: IndexedPoint) -> bool {
        if !point.is_indexable() {
            tracing::warn!(id = %point.id, "Not indexing artifact with invalid coordinates");
            return false;
        }
        self.tree.insert(point);
        true
    }

    /// Points inside the closed rectangle `[min_x, max_x] x [min_y, max_y]`.
    ///
    /// x is longitude, y is latitude. An inverted rectangle (`min > max`)
    /// matches nothing.
    pub fn search_bbox(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<&IndexedPoint> {
        // from_corners would silently reorder inverted corners
        if !(min_x <= max_x && min_y <= max_y) {
            return Vec::new();
        }

        let bbox = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree.locate_in_envelope(&bbox).collect()
    }

    /// Get the total number of points in the index
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Clear the index
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

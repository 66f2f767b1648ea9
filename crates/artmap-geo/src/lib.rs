//! Artmap Geo - Distance math, spatial indexing, and viewport clustering
//!
//! Everything in this crate is a pure function of its inputs or a plain
//! data structure owned by a store. Storage adapters build their query
//! semantics on top of it so that every backend answers identically.

pub mod circle;
pub mod cluster;
pub mod distance;
pub mod index;
pub mod validation;

pub use circle::{prefilter_bounds, tally_categories, within_circle};
pub use cluster::{
    apply_limit, cluster_from_cell, cluster_viewport, grid_size, GridCell, CLUSTERING_MAX_ZOOM,
    CLUSTER_THRESHOLD,
};
pub use distance::{distance_meters, to_point};
pub use index::{IndexedPoint, SpatialIndex};
pub use validation::{is_valid_coordinate, validate_insert, ValidationResult};

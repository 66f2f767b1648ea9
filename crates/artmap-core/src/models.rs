pub mod artifact;
pub mod layer;
pub mod query;
pub mod viewport;

pub use artifact::{Artifact, ArtifactId, InsertArtifact, DEFAULT_LAYER};
pub use layer::{InsertLayer, Layer, LayerFilter};
pub use query::{AggregateResult, Bounds, CircleSelection, Coordinate};
pub use viewport::{ClusterData, ViewportResponse};

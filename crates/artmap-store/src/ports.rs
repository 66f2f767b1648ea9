use async_trait::async_trait;
use artmap_core::error::Result;
use artmap_core::models::{
    AggregateResult, Artifact, ArtifactId, Bounds, CircleSelection, InsertArtifact, InsertLayer,
    Layer, LayerFilter, ViewportResponse,
};

/// Port for artifact storage and spatial queries.
///
/// Every adapter must return the same results for the same data: bounds
/// queries are boundary-inclusive, circle queries use haversine distance
/// with an inclusive radius, and viewport queries follow the grid
/// clustering and truncation rules of `artmap_geo::cluster`.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store a new artifact, assigning its id and defaults
    async fn create(&self, artifact: InsertArtifact) -> Result<Artifact>;

    /// Store several artifacts, preserving input order in the output
    async fn create_many(&self, artifacts: Vec<InsertArtifact>) -> Result<Vec<Artifact>>;

    /// Retrieve an artifact by ID
    async fn get(&self, id: ArtifactId) -> Result<Option<Artifact>>;

    /// All artifacts in the selected layers
    async fn get_all(&self, layers: &LayerFilter) -> Result<Vec<Artifact>>;

    /// Artifacts inside the bounds, edges included
    async fn get_in_bounds(&self, bounds: &Bounds, layers: &LayerFilter) -> Result<Vec<Artifact>>;

    /// Artifacts within `circle.radius` meters of the center
    async fn get_in_circle(
        &self,
        circle: &CircleSelection,
        layers: &LayerFilter,
    ) -> Result<Vec<Artifact>>;

    /// Category tally over a circle selection
    async fn aggregate(
        &self,
        circle: &CircleSelection,
        layers: &LayerFilter,
    ) -> Result<AggregateResult>;

    /// Clusters and singles for a map viewport, at most `limit` items
    async fn get_viewport_data(
        &self,
        bounds: &Bounds,
        zoom: u8,
        limit: usize,
        layers: &LayerFilter,
    ) -> Result<ViewportResponse>;

    /// Number of artifacts in the selected layers
    async fn count(&self, layers: &LayerFilter) -> Result<usize>;

    /// List all layers
    async fn list_layers(&self) -> Result<Vec<Layer>>;

    /// Get a layer by ID
    async fn get_layer(&self, id: &str) -> Result<Option<Layer>>;

    /// Register a layer, keeping the artifact count of an existing entry
    async fn create_layer(&self, layer: InsertLayer) -> Result<Layer>;

    /// Show or hide a layer; unknown ids are ignored
    async fn set_layer_visible(&self, id: &str, visible: bool) -> Result<()>;

    /// Delete a layer and every artifact in it
    async fn delete_layer(&self, id: &str) -> Result<()>;
}

//! In-memory artifact store for single-process deployments and testing.
//!
//! All state sits behind one `RwLock`: reads share it, and every write
//! (create, batch create, layer deletion with its index rebuild) holds the
//! write half for the whole map + index + layer counter update, so a reader
//! never observes one without the others. A poisoned lock is recovered
//! rather than propagated; no write leaves the state half-applied.

use async_trait::async_trait;
use artmap_core::error::Result;
use artmap_core::models::{
    AggregateResult, Artifact, ArtifactId, Bounds, CircleSelection, InsertArtifact, InsertLayer,
    Layer, LayerFilter, ViewportResponse,
};
use artmap_geo::{
    cluster_viewport, prefilter_bounds, tally_categories, within_circle, IndexedPoint,
    SpatialIndex,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ports::ArtifactStore;

/// Canonical artifact map, its spatial index, and the layer registry
#[derive(Debug, Default)]
struct MemoryState {
    artifacts: HashMap<ArtifactId, Artifact>,
    index: SpatialIndex,
    layers: BTreeMap<String, Layer>,
}

impl MemoryState {
    /// Add to map, index and layer counter together
    fn insert(&mut self, artifact: Artifact) {
        self.bump_layer(&artifact.layer);
        self.index.insert(IndexedPoint::from(&artifact));
        self.artifacts.insert(artifact.id, artifact);
    }

    fn bump_layer(&mut self, layer: &str) {
        self.layers
            .entry(layer.to_string())
            .or_insert_with(|| Layer::implicit(layer))
            .artifact_count += 1;
    }

    fn rebuild_index(&mut self) {
        let points = self.artifacts.values().map(IndexedPoint::from).collect();
        self.index.bulk_load(points);
    }

    fn in_bounds(&self, bounds: &Bounds, layers: &LayerFilter) -> Vec<Artifact> {
        self.index
            .search_bbox(bounds.west, bounds.south, bounds.east, bounds.north)
            .into_iter()
            .filter_map(|point| self.artifacts.get(&point.id))
            .filter(|artifact| layers.matches(&artifact.layer))
            .cloned()
            .collect()
    }
}

/// In-memory implementation of ArtifactStore
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryArtifactStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `artifacts`, indexed in one bulk load
    pub fn with_seed(artifacts: Vec<InsertArtifact>) -> Self {
        let store = Self::new();
        store.seed(artifacts);
        store
    }

    /// Add many artifacts and rebuild the index once instead of inserting each point
    pub fn seed(&self, artifacts: Vec<InsertArtifact>) -> Vec<Artifact> {
        let created: Vec<Artifact> =
            artifacts.into_iter().map(|a| a.into_artifact(ArtifactId::new())).collect();

        let mut state = self.write();
        for artifact in &created {
            state.bump_layer(&artifact.layer);
            state.artifacts.insert(artifact.id, artifact.clone());
        }
        state.rebuild_index();

        tracing::info!(
            seeded = created.len(),
            total = state.artifacts.len(),
            "Seeded in-memory artifact store"
        );
        created
    }

    /// Rebuild the spatial index from the artifact map
    pub fn rebuild_index(&self) {
        let mut state = self.write();
        state.rebuild_index();
        tracing::info!(indexed = state.index.len(), "Rebuilt spatial index");
    }

    /// Drop every artifact and layer
    pub fn reset(&self) {
        *self.write() = MemoryState::default();
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn create(&self, artifact: InsertArtifact) -> Result<Artifact> {
        let artifact = artifact.into_artifact(ArtifactId::new());
        self.write().insert(artifact.clone());
        Ok(artifact)
    }

    async fn create_many(&self, artifacts: Vec<InsertArtifact>) -> Result<Vec<Artifact>> {
        if artifacts.is_empty() {
            return Ok(Vec::new());
        }

        let created: Vec<Artifact> =
            artifacts.into_iter().map(|a| a.into_artifact(ArtifactId::new())).collect();

        let mut state = self.write();
        for artifact in &created {
            state.insert(artifact.clone());
        }
        Ok(created)
    }

    async fn get(&self, id: ArtifactId) -> Result<Option<Artifact>> {
        Ok(self.read().artifacts.get(&id).cloned())
    }

    async fn get_all(&self, layers: &LayerFilter) -> Result<Vec<Artifact>> {
        let state = self.read();
        Ok(state.artifacts.values().filter(|a| layers.matches(&a.layer)).cloned().collect())
    }

    async fn get_in_bounds(&self, bounds: &Bounds, layers: &LayerFilter) -> Result<Vec<Artifact>> {
        Ok(self.read().in_bounds(bounds, layers))
    }

    async fn get_in_circle(
        &self,
        circle: &CircleSelection,
        layers: &LayerFilter,
    ) -> Result<Vec<Artifact>> {
        let prefilter = prefilter_bounds(circle);
        let candidates = self.read().in_bounds(&prefilter, layers);
        let candidate_count = candidates.len();

        let matches: Vec<Artifact> =
            candidates.into_iter().filter(|a| within_circle(circle, a.lat, a.lng)).collect();

        tracing::debug!(
            radius = circle.radius,
            candidates = candidate_count,
            matches = matches.len(),
            "Circle query"
        );
        Ok(matches)
    }

    async fn aggregate(
        &self,
        circle: &CircleSelection,
        layers: &LayerFilter,
    ) -> Result<AggregateResult> {
        let matches = self.get_in_circle(circle, layers).await?;
        Ok(tally_categories(matches))
    }

    async fn get_viewport_data(
        &self,
        bounds: &Bounds,
        zoom: u8,
        limit: usize,
        layers: &LayerFilter,
    ) -> Result<ViewportResponse> {
        let artifacts = self.read().in_bounds(bounds, layers);
        Ok(cluster_viewport(artifacts, zoom, limit))
    }

    async fn count(&self, layers: &LayerFilter) -> Result<usize> {
        let state = self.read();
        if layers.is_all() {
            return Ok(state.artifacts.len());
        }
        Ok(state.artifacts.values().filter(|a| layers.matches(&a.layer)).count())
    }

    async fn list_layers(&self) -> Result<Vec<Layer>> {
        Ok(self.read().layers.values().cloned().collect())
    }

    async fn get_layer(&self, id: &str) -> Result<Option<Layer>> {
        Ok(self.read().layers.get(id).cloned())
    }

    async fn create_layer(&self, layer: InsertLayer) -> Result<Layer> {
        let mut state = self.write();
        let count = state.layers.get(&layer.id).map(|l| l.artifact_count).unwrap_or(0);
        let layer = layer.into_layer(count);
        state.layers.insert(layer.id.clone(), layer.clone());
        Ok(layer)
    }

    async fn set_layer_visible(&self, id: &str, visible: bool) -> Result<()> {
        if let Some(layer) = self.write().layers.get_mut(id) {
            layer.visible = visible;
        }
        Ok(())
    }

    async fn delete_layer(&self, id: &str) -> Result<()> {
        let mut state = self.write();
        let before = state.artifacts.len();
        state.artifacts.retain(|_, artifact| artifact.layer != id);
        let removed = before - state.artifacts.len();

        state.rebuild_index();
        state.layers.remove(id);

        tracing::info!(layer = id, removed, remaining = state.artifacts.len(), "Deleted layer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn insert(layer: &str, lat: f64, lng: f64) -> InsertArtifact {
        InsertArtifact::new("artifact", "relic", lat, lng).with_layer(layer)
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = MemoryArtifactStore::new();
        let created = store.create(InsertArtifact::new("Well", "water", 41.5, -72.7)).await.unwrap();

        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));
        assert_eq!(created.layer, "default");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryArtifactStore::new();
        assert!(store.get(ArtifactId::new()).await.unwrap().is_none());
        assert!(store.get_layer("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_many_preserves_order() {
        let store = MemoryArtifactStore::new();
        let inputs: Vec<InsertArtifact> = (0..5).map(|i| insert("a", i as f64, 0.0)).collect();

        let created = store.create_many(inputs).await.unwrap();

        let lats: Vec<f64> = created.iter().map(|a| a.lat).collect();
        assert_eq!(lats, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(store.create_many(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_layer_created_implicitly_and_counted() {
        let store = MemoryArtifactStore::new();
        store.create(insert("roads", 1.0, 1.0)).await.unwrap();
        store.create(insert("roads", 2.0, 2.0)).await.unwrap();
        store.create(insert("rivers", 3.0, 3.0)).await.unwrap();

        let roads = store.get_layer("roads").await.unwrap().unwrap();
        assert_eq!(roads.artifact_count, 2);
        assert_eq!(roads.name, "roads");
        assert!(roads.visible);

        let ids: Vec<String> = store.list_layers().await.unwrap().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec!["rivers", "roads"]);
    }

    #[tokio::test]
    async fn test_create_layer_keeps_count() {
        let store = MemoryArtifactStore::new();
        store.create(insert("survey", 1.0, 1.0)).await.unwrap();

        let mut layer = InsertLayer::new("survey", "2024 Survey");
        layer.style = Some(json!({"color": "#ff0000"}));
        let layer = store.create_layer(layer).await.unwrap();

        assert_eq!(layer.name, "2024 Survey");
        assert_eq!(layer.artifact_count, 1);
        assert_eq!(store.get_layer("survey").await.unwrap(), Some(layer));
    }

    #[tokio::test]
    async fn test_set_layer_visible() {
        let store = MemoryArtifactStore::new();
        store.create_layer(InsertLayer::new("x", "X")).await.unwrap();

        store.set_layer_visible("x", false).await.unwrap();
        assert!(!store.get_layer("x").await.unwrap().unwrap().visible);

        // Unknown layer is a no-op
        store.set_layer_visible("missing", false).await.unwrap();
        assert!(store.get_layer("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_with_filter() {
        let store = MemoryArtifactStore::new();
        store.create(insert("a", 0.0, 0.0)).await.unwrap();
        store.create(insert("b", 0.0, 0.0)).await.unwrap();
        store.create(insert("b", 0.0, 0.0)).await.unwrap();

        assert_eq!(store.count(&LayerFilter::all()).await.unwrap(), 3);
        assert_eq!(store.count(&LayerFilter::only(["b"])).await.unwrap(), 2);
        assert_eq!(store.count(&LayerFilter::only(["c"])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seed_bulk_loads_index() {
        let store = MemoryArtifactStore::with_seed(vec![
            insert("a", 10.0, 10.0),
            insert("a", 20.0, 20.0),
            insert("b", 30.0, 30.0),
        ]);

        let hits = store.get_in_bounds(&Bounds::new(25.0, 5.0, 25.0, 5.0), &LayerFilter::all()).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(store.get_layer("a").await.unwrap().unwrap().artifact_count, 2);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let store = MemoryArtifactStore::with_seed(vec![insert("a", 1.0, 1.0)]);
        store.reset();

        assert_eq!(store.count(&LayerFilter::all()).await.unwrap(), 0);
        assert!(store.list_layers().await.unwrap().is_empty());
        assert!(store.get_in_bounds(&Bounds::world(), &LayerFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_values_do_not_crash() {
        let store = MemoryArtifactStore::new();
        let odd = store.create(InsertArtifact::new("odd", "c", 200.0, -500.0)).await.unwrap();
        let nan = store.create(InsertArtifact::new("nan", "c", f64::NAN, 0.0)).await.unwrap();

        assert!(store.get(odd.id).await.unwrap().is_some());
        assert!(store.get(nan.id).await.unwrap().is_some());

        let everywhere = Bounds::new(1000.0, -1000.0, 1000.0, -1000.0);
        let hits = store.get_in_bounds(&everywhere, &LayerFilter::all()).await.unwrap();
        assert!(hits.is_empty());
        store.rebuild_index();
        assert_eq!(store.count(&LayerFilter::all()).await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_and_writes() {
        let store = MemoryArtifactStore::new();
        let mut handles = Vec::new();

        for writer in 0..4 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    let lat = (writer * 50 + i) as f64 * 0.01;
                    store.create(insert("w", lat, 0.0)).await.unwrap();
                }
            }));
        }
        for _ in 0..4 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let all = store.get_all(&LayerFilter::all()).await.unwrap();
                    assert!(all.len() <= 200);
                    let indexed =
                        store.get_in_bounds(&Bounds::world(), &LayerFilter::all()).await.unwrap();
                    assert!(indexed.len() <= 200);
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.count(&LayerFilter::all()).await.unwrap(), 200);
        assert_eq!(store.get_layer("w").await.unwrap().unwrap().artifact_count, 200);
        let indexed = store.get_in_bounds(&Bounds::world(), &LayerFilter::all()).await.unwrap();
        assert_eq!(indexed.len(), 200);
    }
}

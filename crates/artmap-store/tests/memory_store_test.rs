//! Behavioral tests for the in-memory store through the `ArtifactStore` contract

use artmap_core::models::{
    Artifact, ArtifactId, Bounds, CircleSelection, InsertArtifact, LayerFilter,
};
use artmap_geo::distance_meters;
use artmap_store::memory::MemoryArtifactStore;
use artmap_store::ports::ArtifactStore;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn store() -> Arc<dyn ArtifactStore> {
    Arc::new(MemoryArtifactStore::new())
}

fn at(lat: f64, lng: f64) -> InsertArtifact {
    InsertArtifact::new("artifact", "relic", lat, lng)
}

fn ids(artifacts: &[Artifact]) -> HashSet<ArtifactId> {
    artifacts.iter().map(|a| a.id).collect()
}

#[tokio::test]
async fn test_circle_query_near_center() {
    let store = store();
    let center = store.create(at(41.5, -72.7)).await.unwrap();
    let near = store.create(at(41.5045, -72.7)).await.unwrap();
    let far = store.create(at(41.518, -72.7)).await.unwrap();

    let hits = store
        .get_in_circle(&CircleSelection::new(41.5, -72.7, 1000.0), &LayerFilter::all())
        .await
        .unwrap();
    let hit_ids = ids(&hits);
    assert_eq!(hit_ids.len(), 2);
    assert!(hit_ids.contains(&center.id));
    assert!(hit_ids.contains(&near.id));
    assert!(!hit_ids.contains(&far.id));

    let hits = store
        .get_in_circle(&CircleSelection::new(41.5, -72.7, 10.0), &LayerFilter::all())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, center.id);
}

#[tokio::test]
async fn test_circle_query_one_degree_at_equator() {
    let store = store();
    let a = store.create(at(0.0, 0.0)).await.unwrap();
    store.create(at(1.0, 0.0)).await.unwrap();

    let hits = store
        .get_in_circle(&CircleSelection::new(0.0, 0.0, 50_000.0), &LayerFilter::all())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, a.id);

    let hits = store
        .get_in_circle(&CircleSelection::new(0.0, 0.0, 120_000.0), &LayerFilter::all())
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn test_viewport_clusters_dense_area() {
    let store = store();
    let dense: Vec<InsertArtifact> = (0..20)
        .map(|i| at(41.501 + (i % 5) as f64 * 0.002, -72.701 + (i / 5) as f64 * 0.002))
        .collect();
    store.create_many(dense).await.unwrap();
    let distant = store
        .create_many(vec![at(42.1, -72.2), at(42.2, -72.1)])
        .await
        .unwrap();

    let response = store
        .get_viewport_data(&Bounds::new(43.0, 41.0, -71.0, -73.0), 10, 500, &LayerFilter::all())
        .await
        .unwrap();

    assert!(!response.clusters.is_empty());
    assert_eq!(response.total, 22);
    assert!(!response.truncated);
    let single_ids = ids(&response.singles);
    assert!(distant.iter().all(|a| single_ids.contains(&a.id)));
    let folded: usize = response.clusters.iter().map(|c| c.count).sum();
    assert_eq!(folded + response.singles.len(), 22);
}

#[tokio::test]
async fn test_viewport_high_zoom_truncates() {
    let store = store();
    let inputs: Vec<InsertArtifact> =
        (0..10).map(|i| at(41.5 + i as f64 * 1e-4, -72.7 + i as f64 * 1e-4)).collect();
    store.create_many(inputs).await.unwrap();

    let response = store
        .get_viewport_data(&Bounds::new(41.6, 41.4, -72.6, -72.8), 15, 5, &LayerFilter::all())
        .await
        .unwrap();

    assert!(response.clusters.is_empty());
    assert_eq!(response.singles.len(), 5);
    assert_eq!(response.total, 10);
    assert!(response.truncated);
}

#[tokio::test]
async fn test_high_zoom_truncation_is_deterministic() {
    let store = store();
    let inputs: Vec<InsertArtifact> = (0..30).map(|i| at(10.0 + i as f64 * 1e-3, 10.0)).collect();
    let created = store.create_many(inputs).await.unwrap();

    let bounds = Bounds::new(11.0, 9.0, 11.0, 9.0);
    let first = store.get_viewport_data(&bounds, 14, 7, &LayerFilter::all()).await.unwrap();
    let second = store.get_viewport_data(&bounds, 14, 7, &LayerFilter::all()).await.unwrap();
    assert_eq!(first, second);

    let mut expected: Vec<ArtifactId> = created.iter().map(|a| a.id).collect();
    expected.sort();
    let got: Vec<ArtifactId> = first.singles.iter().map(|a| a.id).collect();
    assert_eq!(got, expected[..7].to_vec());
}

#[tokio::test]
async fn test_delete_layer_rebuilds_index() {
    let store = store();
    store.create(at(1.0, 1.0).with_layer("x")).await.unwrap();
    store.create(at(2.0, 2.0).with_layer("x")).await.unwrap();
    let kept = store.create(at(3.0, 3.0).with_layer("y")).await.unwrap();

    store.delete_layer("x").await.unwrap();

    let all = store.get_all(&LayerFilter::all()).await.unwrap();
    assert_eq!(all, vec![kept.clone()]);

    let world = store.get_in_bounds(&Bounds::world(), &LayerFilter::all()).await.unwrap();
    assert_eq!(world, vec![kept]);

    assert!(store.get_layer("x").await.unwrap().is_none());
    assert_eq!(store.get_layer("y").await.unwrap().unwrap().artifact_count, 1);
}

#[tokio::test]
async fn test_delete_unknown_layer_is_noop() {
    let store = store();
    store.create(at(1.0, 1.0)).await.unwrap();
    store.delete_layer("ghost").await.unwrap();
    assert_eq!(store.count(&LayerFilter::all()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_bounds_include_every_edge() {
    let store = store();
    let bounds = Bounds::new(10.0, -10.0, 20.0, -20.0);
    let edges = store
        .create_many(vec![
            at(10.0, 0.0),
            at(-10.0, 0.0),
            at(0.0, 20.0),
            at(0.0, -20.0),
            at(10.0, 20.0),
            at(-10.0, -20.0),
        ])
        .await
        .unwrap();
    store.create(at(10.0001, 0.0)).await.unwrap();

    let hits = store.get_in_bounds(&bounds, &LayerFilter::all()).await.unwrap();
    assert_eq!(ids(&hits), ids(&edges));
}

#[tokio::test]
async fn test_circle_includes_point_at_radius() {
    let store = store();
    let edge = store.create(at(48.8566, 2.3522)).await.unwrap();
    let radius = distance_meters(48.85, 2.35, 48.8566, 2.3522);

    let hits = store
        .get_in_circle(&CircleSelection::new(48.85, 2.35, radius), &LayerFilter::all())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, edge.id);
}

#[tokio::test]
async fn test_cluster_threshold_three_and_four() {
    let store = store();
    // Grid at zoom 5 is 2 degrees: cell (0, 0) gets 3, cell (1, 0) gets 4
    store.create_many((0..3).map(|i| at(0.5, 0.2 + i as f64 * 0.1)).collect()).await.unwrap();
    store.create_many((0..4).map(|i| at(0.5, 2.2 + i as f64 * 0.1)).collect()).await.unwrap();

    let response = store
        .get_viewport_data(&Bounds::new(1.0, 0.0, 4.0, 0.0), 5, 100, &LayerFilter::all())
        .await
        .unwrap();

    assert_eq!(response.singles.len(), 3);
    assert_eq!(response.clusters.len(), 1);
    assert_eq!(response.clusters[0].count, 4);
    assert_eq!(response.clusters[0].id, "cluster-1:0");
}

#[tokio::test]
async fn test_clusters_beyond_limit_drop_singles() {
    let store = store();
    for cell in 0..5 {
        let lng = cell as f64 * 2.0 + 0.5;
        store.create_many((0..4).map(|_| at(0.5, lng)).collect()).await.unwrap();
    }
    store.create(at(0.5, 11.0)).await.unwrap();

    let response = store
        .get_viewport_data(&Bounds::new(1.0, 0.0, 12.0, 0.0), 3, 3, &LayerFilter::all())
        .await
        .unwrap();

    assert_eq!(response.clusters.len(), 3);
    assert!(response.singles.is_empty());
    assert!(response.truncated);
    assert_eq!(response.total, 21);
}

#[tokio::test]
async fn test_layer_filter_applies_to_queries() {
    let store = store();
    store.create(at(5.0, 5.0).with_layer("roads")).await.unwrap();
    let river = store.create(at(5.0, 5.0).with_layer("rivers")).await.unwrap();

    let rivers = LayerFilter::only(["rivers"]);
    let hits = store.get_in_bounds(&Bounds::world(), &rivers).await.unwrap();
    assert_eq!(hits, vec![river.clone()]);

    let circle = CircleSelection::new(5.0, 5.0, 10.0);
    let aggregate = store.aggregate(&circle, &rivers).await.unwrap();
    assert_eq!(aggregate.count, 1);

    let viewport = store.get_viewport_data(&Bounds::world(), 18, 10, &rivers).await.unwrap();
    assert_eq!(viewport.singles, vec![river]);
}

#[tokio::test]
async fn test_aggregate_counts_categories() {
    let store = store();
    store.create(InsertArtifact::new("a", "well", 0.0, 0.0)).await.unwrap();
    store.create(InsertArtifact::new("b", "well", 0.001, 0.0)).await.unwrap();
    store.create(InsertArtifact::new("c", "shrine", 0.0, 0.001)).await.unwrap();
    store.create(InsertArtifact::new("d", "tomb", 5.0, 5.0)).await.unwrap();

    let result = store
        .aggregate(&CircleSelection::new(0.0, 0.0, 1000.0), &LayerFilter::all())
        .await
        .unwrap();

    assert_eq!(result.count, 3);
    assert_eq!(result.categories.get("well"), Some(&2));
    assert_eq!(result.categories.get("shrine"), Some(&1));
    assert!(!result.categories.contains_key("tomb"));
}

#[tokio::test]
async fn test_get_all_is_idempotent() {
    let store = store();
    store.create_many((0..25).map(|i| at(i as f64, -(i as f64))).collect()).await.unwrap();

    let first = ids(&store.get_all(&LayerFilter::all()).await.unwrap());
    let second = ids(&store.get_all(&LayerFilter::all()).await.unwrap());
    assert_eq!(first, second);
    assert_eq!(first.len(), 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_see_consistent_state() {
    let memory = MemoryArtifactStore::with_seed((0..100).map(|i| at(i as f64 * 0.1, 0.0)).collect());
    let store: Arc<dyn ArtifactStore> = Arc::new(memory);

    let readers = (0..8).map(|_| {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            let viewport = store
                .get_viewport_data(&Bounds::world(), 2, 1000, &LayerFilter::all())
                .await
                .unwrap();
            let all = store.get_all(&LayerFilter::all()).await.unwrap();
            (viewport.total, all.len())
        })
    });

    for result in futures::future::join_all(readers).await {
        assert_eq!(result.unwrap(), (100, 100));
    }
}

proptest! {
    #[test]
    fn prop_round_trip_and_bounds_membership(
        points in proptest::collection::vec((-90.0f64..=90.0, -180.0f64..=180.0), 1..40),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let store = store();
            let created = store
                .create_many(points.iter().map(|&(lat, lng)| at(lat, lng)).collect())
                .await
                .unwrap();

            for artifact in &created {
                let fetched = store.get(artifact.id).await.unwrap();
                prop_assert_eq!(fetched.as_ref(), Some(artifact));

                // Degenerate box at exactly the artifact's position
                let bounds = Bounds::new(artifact.lat, artifact.lat, artifact.lng, artifact.lng);
                let hits = store.get_in_bounds(&bounds, &LayerFilter::all()).await.unwrap();
                prop_assert!(hits.iter().any(|a| a.id == artifact.id));
            }
            Ok::<(), proptest::test_runner::TestCaseError>(())
        })?;
    }
}

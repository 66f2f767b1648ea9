//! GeoJSON rendering of query results

use anyhow::Result;
use artmap_core::models::{Artifact, ClusterData, Coordinate, ViewportResponse};
use artmap_geo::to_point;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

fn point_geometry(lat: f64, lng: f64) -> Geometry {
    Geometry::new(Value::from(&to_point(Coordinate::new(lat, lng))))
}

/// Artifact as a Point feature; every field except id and position becomes a property
pub fn artifact_feature(artifact: &Artifact) -> Result<Feature> {
    let mut properties = match serde_json::to_value(artifact)? {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    for key in ["id", "lat", "lng"] {
        properties.remove(key);
    }

    Ok(Feature {
        bbox: None,
        geometry: Some(point_geometry(artifact.lat, artifact.lng)),
        id: Some(Id::String(artifact.id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    })
}

/// Cluster as a Point feature flagged with `cluster: true`
pub fn cluster_feature(cluster: &ClusterData) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("cluster".to_string(), serde_json::Value::Bool(true));
    properties.insert("count".to_string(), cluster.count.into());

    Feature {
        bbox: None,
        geometry: Some(point_geometry(cluster.lat, cluster.lng)),
        id: Some(Id::String(cluster.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn artifacts_collection(artifacts: &[Artifact]) -> Result<FeatureCollection> {
    let features = artifacts.iter().map(artifact_feature).collect::<Result<Vec<_>>>()?;
    Ok(FeatureCollection { bbox: None, features, foreign_members: None })
}

/// Clusters first, then singles; `total` and `truncated` ride along as foreign members
pub fn viewport_collection(response: &ViewportResponse) -> Result<FeatureCollection> {
    let mut features: Vec<Feature> = response.clusters.iter().map(cluster_feature).collect();
    for single in &response.singles {
        features.push(artifact_feature(single)?);
    }

    let mut members = JsonObject::new();
    members.insert("total".to_string(), response.total.into());
    members.insert("truncated".to_string(), response.truncated.into());

    Ok(FeatureCollection { bbox: None, features, foreign_members: Some(members) })
}

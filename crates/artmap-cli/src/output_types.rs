use artmap_core::models::{Artifact, ClusterData, Layer};
use serde::Serialize;
use tabled::Tabled;

/// Table row for one artifact
#[derive(Debug, Tabled)]
pub struct ArtifactRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Layer")]
    pub layer: String,
    #[tabled(rename = "Lat")]
    pub lat: String,
    #[tabled(rename = "Lng")]
    pub lng: String,
}

impl From<&Artifact> for ArtifactRow {
    fn from(artifact: &Artifact) -> Self {
        let id = artifact.id.to_string();
        Self {
            id: id.chars().take(8).collect(),
            name: artifact.name.clone(),
            category: artifact.category.clone(),
            layer: artifact.layer.clone(),
            lat: format!("{:.6}", artifact.lat),
            lng: format!("{:.6}", artifact.lng),
        }
    }
}

/// Table row for one cluster
#[derive(Debug, Tabled)]
pub struct ClusterRow {
    #[tabled(rename = "Cluster")]
    pub id: String,
    #[tabled(rename = "Count")]
    pub count: usize,
    #[tabled(rename = "Lat")]
    pub lat: String,
    #[tabled(rename = "Lng")]
    pub lng: String,
}

impl From<&ClusterData> for ClusterRow {
    fn from(cluster: &ClusterData) -> Self {
        Self {
            id: cluster.id.clone(),
            count: cluster.count,
            lat: format!("{:.6}", cluster.lat),
            lng: format!("{:.6}", cluster.lng),
        }
    }
}

/// Table row for one layer
#[derive(Debug, Tabled)]
pub struct LayerRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Artifacts")]
    pub artifact_count: usize,
    #[tabled(rename = "Visible")]
    pub visible: bool,
    #[tabled(rename = "Source")]
    pub source: String,
}

impl From<&Layer> for LayerRow {
    fn from(layer: &Layer) -> Self {
        Self {
            id: layer.id.clone(),
            name: layer.name.clone(),
            artifact_count: layer.artifact_count,
            visible: layer.visible,
            source: layer.source.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Table row for one aggregated category
#[derive(Debug, Tabled)]
pub struct CategoryRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Count")]
    pub count: usize,
}

/// Table row for one configuration entry
#[derive(Debug, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// Output for the seed command
#[derive(Debug, Serialize)]
pub struct SeedOutput {
    pub read: usize,
    pub inserted: usize,
    pub backend: String,
}

/// Output for the count command
#[derive(Debug, Serialize)]
pub struct CountOutput {
    pub count: usize,
    pub layers: Vec<String>,
}

use serde::{Deserialize, Serialize};

/// A named partition of the artifact space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Number of artifacts in the layer, maintained on insert
    pub artifact_count: usize,

    pub visible: bool,

    /// Opaque client-side styling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<serde_json::Value>,
}

impl Layer {
    /// Registry entry created on first artifact insert referencing an unknown layer
    pub fn implicit(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            source: None,
            artifact_count: 0,
            visible: true,
            style: None,
        }
    }
}

/// Layer as supplied to `create_layer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertLayer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub style: Option<serde_json::Value>,
}

impl InsertLayer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            source: None,
            visible: None,
            style: None,
        }
    }

    /// Build the registry entry, carrying over an existing artifact count
    pub fn into_layer(self, artifact_count: usize) -> Layer {
        Layer {
            id: self.id,
            name: self.name,
            description: self.description,
            source: self.source,
            artifact_count,
            visible: self.visible.unwrap_or(true),
            style: self.style,
        }
    }
}

/// Restriction of a query to a set of layer ids.
///
/// An empty set matches every layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerFilter {
    layers: Vec<String>,
}

impl LayerFilter {
    /// Match artifacts in any layer
    pub fn all() -> Self {
        Self::default()
    }

    /// Match artifacts in the given layers only
    pub fn only<I, S>(layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { layers: layers.into_iter().map(Into::into).collect() }
    }

    pub fn is_all(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn matches(&self, layer: &str) -> bool {
        self.is_all() || self.layers.iter().any(|l| l == layer)
    }

    /// Layer ids to bind into a query, `None` when unrestricted
    pub fn layer_ids(&self) -> Option<&[String]> {
        if self.is_all() {
            None
        } else {
            Some(&self.layers)
        }
    }
}

impl From<Option<Vec<String>>> for LayerFilter {
    fn from(layers: Option<Vec<String>>) -> Self {
        Self { layers: layers.unwrap_or_default() }
    }
}

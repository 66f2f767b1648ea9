use crate::errors;
use anyhow::{Context, Result};
use artmap_core::config::{BackendKind, LayeredConfig};
use artmap_core::models::InsertArtifact;
use artmap_geo::validate_insert;
use artmap_store::memory::MemoryArtifactStore;
use artmap_store::ports::ArtifactStore;
use artmap_store::postgres::{PostgresConfig, PostgresStore};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// The opened artifact store and the backend actually serving it
pub struct Storage {
    pub store: Arc<dyn ArtifactStore>,
    pub backend: BackendKind,
}

impl Storage {
    /// Open the configured backend, falling back to memory when allowed
    pub async fn open(config: &LayeredConfig) -> Result<Self> {
        match config.backend.value {
            BackendKind::Memory => Self::new_memory(config),
            BackendKind::Postgres => match Self::new_postgres(config).await {
                Ok(storage) => Ok(storage),
                Err(err) if config.fallback_to_memory.value => {
                    tracing::warn!(error = %err, "PostgreSQL unavailable, falling back to in-memory store");
                    Self::new_memory(config)
                }
                Err(err) => Err(err),
            },
        }
    }

    /// In-memory store, bulk-loaded from the configured seed file if any
    fn new_memory(config: &LayeredConfig) -> Result<Self> {
        let store = match &config.seed_file.value {
            Some(path) => MemoryArtifactStore::with_seed(load_seed_file(path)?.artifacts),
            None => MemoryArtifactStore::new(),
        };

        Ok(Self { store: Arc::new(store), backend: BackendKind::Memory })
    }

    async fn new_postgres(config: &LayeredConfig) -> Result<Self> {
        let url = config.database_url.value.clone().ok_or_else(errors::database_url_missing)?;
        let pg_config = PostgresConfig::new(url.clone())?;

        let store = PostgresStore::open(pg_config)
            .await
            .map_err(|e| errors::database_unavailable(&url, e))?;

        if config.seed_file.value.is_some() {
            tracing::info!("Seed file ignored for the postgres backend; use `artmap seed` instead");
        }

        Ok(Self { store: Arc::new(store), backend: BackendKind::Postgres })
    }
}

/// Artifacts read from a seed file that passed validation
#[derive(Debug)]
pub struct SeedFile {
    pub artifacts: Vec<InsertArtifact>,
    pub skipped: usize,
}

/// Read a JSON array of artifacts, dropping entries that fail validation
pub fn load_seed_file(path: &Path) -> Result<SeedFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    parse_seed(&content).with_context(|| format!("Failed to parse seed file {}", path.display()))
}

fn parse_seed(content: &str) -> Result<SeedFile> {
    let inserts: Vec<InsertArtifact> = serde_json::from_str(content)?;

    let total = inserts.len();
    let mut valid = Vec::with_capacity(total);
    for (position, insert) in inserts.into_iter().enumerate() {
        let result = validate_insert(&insert);
        if result.is_valid {
            valid.push(insert);
        } else {
            for error in &result.errors {
                tracing::warn!(position, location = %error.location, reason = %error.reason, "Skipping invalid seed artifact");
            }
        }
    }

    Ok(SeedFile { skipped: total - valid.len(), artifacts: valid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use artmap_core::config::ConfigSource;
    use artmap_core::models::LayerFilter;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SEED: &str = r#"[
        {"name": "Well", "category": "water", "lat": 41.5, "lng": -72.7},
        {"name": "Shrine", "category": "heritage", "layer": "bali", "lat": -8.5, "lng": 115.26,
         "metadata": {"period": "classical"}},
        {"name": "Nowhere", "category": "error", "lat": 95.0, "lng": 0.0}
    ]"#;

    #[test]
    fn test_parse_seed_skips_invalid() {
        let seed = parse_seed(SEED).unwrap();
        assert_eq!(seed.artifacts.len(), 2);
        assert_eq!(seed.skipped, 1);
        assert_eq!(seed.artifacts[1].layer.as_deref(), Some("bali"));
    }

    #[test]
    fn test_parse_seed_rejects_malformed_json() {
        assert!(parse_seed("{not json").is_err());
    }

    #[tokio::test]
    async fn test_memory_backend_loads_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SEED).unwrap();

        let mut config = LayeredConfig::with_defaults();
        config.seed_file.update(Some(file.path().to_path_buf()), ConfigSource::Cli);

        let storage = Storage::open(&config).await.unwrap();
        assert_eq!(storage.backend, BackendKind::Memory);
        assert_eq!(storage.store.count(&LayerFilter::all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_postgres_without_url_falls_back() {
        let mut config = LayeredConfig::with_defaults();
        config.backend.update(BackendKind::Postgres, ConfigSource::Cli);

        let storage = Storage::open(&config).await.unwrap();
        assert_eq!(storage.backend, BackendKind::Memory);
    }

    #[tokio::test]
    async fn test_postgres_without_url_fails_when_fallback_disabled() {
        let mut config = LayeredConfig::with_defaults();
        config.backend.update(BackendKind::Postgres, ConfigSource::Cli);
        config.fallback_to_memory.update(false, ConfigSource::Cli);

        let err = Storage::open(&config).await.err().unwrap();
        assert!(err.downcast_ref::<errors::CliError>().is_some());
    }
}

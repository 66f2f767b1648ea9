use crate::error::{ArtmapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process spatial index and map
    Memory,
    /// PostgreSQL with PostGIS
    Postgres,
}

/// Viewport limit applied when the caller does not pass one
pub const DEFAULT_VIEWPORT_LIMIT: usize = 500;

/// Layered configuration for Artmap
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub backend: ConfigValue<BackendKind>,
    pub database_url: ConfigValue<Option<String>>,
    pub fallback_to_memory: ConfigValue<bool>,
    pub default_limit: ConfigValue<usize>,
    pub seed_file: ConfigValue<Option<PathBuf>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            backend: ConfigValue::new(BackendKind::Memory, ConfigSource::Default),
            database_url: ConfigValue::new(None, ConfigSource::Default),
            fallback_to_memory: ConfigValue::new(true, ConfigSource::Default),
            default_limit: ConfigValue::new(DEFAULT_VIEWPORT_LIMIT, ConfigSource::Default),
            seed_file: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ArtmapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| ArtmapError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(backend) = file_config.backend {
            self.backend.update(backend, ConfigSource::File);
        }

        if let Some(url) = file_config.database_url {
            self.database_url.update(Some(url), ConfigSource::File);
        }

        if let Some(fallback) = file_config.fallback_to_memory {
            self.fallback_to_memory.update(fallback, ConfigSource::File);
        }

        if let Some(limit) = file_config.default_limit {
            self.default_limit.update(limit, ConfigSource::File);
        }

        if let Some(seed_file) = file_config.seed_file {
            self.seed_file.update(Some(seed_file), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // ARTMAP_BACKEND
        if let Ok(backend_str) = env::var("ARTMAP_BACKEND") {
            match parse_backend(&backend_str) {
                Ok(backend) => self.backend.update(backend, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ARTMAP_BACKEND value '{}': expected memory or postgres",
                    backend_str
                ),
            }
        }

        // DATABASE_URL
        if let Ok(url) = env::var("DATABASE_URL") {
            if url.trim().is_empty() {
                tracing::warn!("Ignoring empty DATABASE_URL");
            } else {
                self.database_url.update(Some(url), ConfigSource::Environment);
            }
        }

        // ARTMAP_FALLBACK
        if let Ok(fallback_str) = env::var("ARTMAP_FALLBACK") {
            match parse_bool(&fallback_str) {
                Some(fallback) => {
                    self.fallback_to_memory.update(fallback, ConfigSource::Environment)
                }
                None => tracing::warn!(
                    "Invalid ARTMAP_FALLBACK value '{}': expected true or false",
                    fallback_str
                ),
            }
        }

        // ARTMAP_DEFAULT_LIMIT
        if let Ok(limit_str) = env::var("ARTMAP_DEFAULT_LIMIT") {
            match limit_str.parse::<usize>() {
                Ok(limit) => self.default_limit.update(limit, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid ARTMAP_DEFAULT_LIMIT value '{}': expected non-negative integer",
                    limit_str
                ),
            }
        }

        // ARTMAP_SEED_FILE
        if let Ok(seed_file) = env::var("ARTMAP_SEED_FILE") {
            self.seed_file.update(Some(PathBuf::from(seed_file)), ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(backend) = overrides.backend {
            self.backend.update(backend, ConfigSource::Cli);
        }

        if let Some(url) = overrides.database_url {
            self.database_url.update(Some(url), ConfigSource::Cli);
        }

        if let Some(fallback) = overrides.fallback_to_memory {
            self.fallback_to_memory.update(fallback, ConfigSource::Cli);
        }

        if let Some(seed_file) = overrides.seed_file {
            self.seed_file.update(Some(seed_file), ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "backend".to_string(),
            (format!("{:?}", self.backend.value).to_lowercase(), self.backend.source),
        );

        // Never echo credentials embedded in the URL
        let url = match &self.database_url.value {
            Some(_) => "<set>".to_string(),
            None => "<unset>".to_string(),
        };
        map.insert("database_url".to_string(), (url, self.database_url.source));

        map.insert(
            "fallback_to_memory".to_string(),
            (self.fallback_to_memory.value.to_string(), self.fallback_to_memory.source),
        );

        map.insert(
            "default_limit".to_string(),
            (self.default_limit.value.to_string(), self.default_limit.source),
        );

        let seed = self
            .seed_file
            .value
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unset>".to_string());
        map.insert("seed_file".to_string(), (seed, self.seed_file.source));

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    backend: Option<BackendKind>,
    database_url: Option<String>,
    fallback_to_memory: Option<bool>,
    default_limit: Option<usize>,
    seed_file: Option<PathBuf>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub backend: Option<BackendKind>,
    pub database_url: Option<String>,
    pub fallback_to_memory: Option<bool>,
    pub seed_file: Option<PathBuf>,
}

/// Parse backend kind from string
pub fn parse_backend(s: &str) -> Result<BackendKind> {
    match s.to_lowercase().as_str() {
        "memory" | "mem" => Ok(BackendKind::Memory),
        "postgres" | "postgresql" | "pg" => Ok(BackendKind::Postgres),
        _ => Err(ArtmapError::ConfigInvalid {
            key: "backend".to_string(),
            reason: format!("Invalid backend: {}. Use memory or postgres", s),
        }),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

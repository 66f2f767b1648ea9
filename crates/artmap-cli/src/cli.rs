use artmap_core::config::{BackendKind, CliConfigOverrides};
use artmap_core::models::{Bounds, CircleSelection, LayerFilter};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Artmap - Geotagged artifact index
#[derive(Parser, Debug)]
#[command(name = "artmap")]
#[command(about = "Index geotagged artifacts and query them by box, radius and viewport", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Storage backend to use (memory or postgres)
    #[arg(long, global = true)]
    pub backend: Option<StorageBackend>,

    /// Configuration file (defaults to ./artmap.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// PostgreSQL connection URL
    #[arg(long, global = true, value_name = "URL")]
    pub database_url: Option<String>,

    /// Fail instead of falling back to memory when PostgreSQL is unavailable
    #[arg(long, global = true)]
    pub no_fallback: bool,

    /// JSON array of artifacts to preload into the in-memory store
    #[arg(long, global = true, value_name = "FILE")]
    pub seed: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            backend: self.backend.map(Into::into),
            database_url: self.database_url.clone(),
            fallback_to_memory: self.no_fallback.then_some(false),
            seed_file: self.seed.clone(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StorageBackend {
    /// In-process spatial index (default)
    Memory,
    /// PostgreSQL with PostGIS
    Postgres,
}

impl From<StorageBackend> for BackendKind {
    fn from(backend: StorageBackend) -> Self {
        match backend {
            StorageBackend::Memory => BackendKind::Memory,
            StorageBackend::Postgres => BackendKind::Postgres,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert artifacts from a JSON file into the store
    Seed(SeedArgs),

    /// Artifacts inside a bounding box
    Bounds(BoundsArgs),

    /// Artifacts within a radius of a point
    Circle(CircleArgs),

    /// Category counts within a radius of a point
    Aggregate(CircleArgs),

    /// Clustered view of a bounding box at a zoom level
    Viewport(ViewportArgs),

    /// Count artifacts
    Count(LayerArgs),

    /// Manage layers
    Layers(LayersArgs),

    /// Show resolved configuration and where each value came from
    Config,
}

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// JSON file containing an array of artifacts
    pub path: PathBuf,

    /// Artifacts inserted per batch
    #[arg(long, default_value = "500")]
    pub batch_size: usize,
}

/// Restrict a query to some layers; repeat for several
#[derive(Args, Debug, Default)]
pub struct LayerArgs {
    #[arg(long = "layer", value_name = "ID")]
    pub layers: Vec<String>,
}

impl LayerArgs {
    pub fn filter(&self) -> LayerFilter {
        if self.layers.is_empty() {
            LayerFilter::all()
        } else {
            LayerFilter::only(self.layers.iter().cloned())
        }
    }
}

#[derive(Args, Debug)]
pub struct BoxArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub north: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub south: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub east: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub west: f64,
}

impl BoxArgs {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.north, self.south, self.east, self.west)
    }
}

#[derive(Args, Debug)]
pub struct BoundsArgs {
    #[command(flatten)]
    pub bounds: BoxArgs,

    #[command(flatten)]
    pub layers: LayerArgs,

    /// Print a GeoJSON FeatureCollection
    #[arg(long)]
    pub geojson: bool,
}

#[derive(Args, Debug)]
pub struct CircleArgs {
    /// Center latitude
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Center longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Radius in meters
    #[arg(long, allow_negative_numbers = true)]
    pub radius: f64,

    #[command(flatten)]
    pub layers: LayerArgs,

    /// Print a GeoJSON FeatureCollection
    #[arg(long)]
    pub geojson: bool,
}

impl CircleArgs {
    pub fn circle(&self) -> CircleSelection {
        CircleSelection::new(self.lat, self.lng, self.radius)
    }
}

#[derive(Args, Debug)]
pub struct ViewportArgs {
    #[command(flatten)]
    pub bounds: BoxArgs,

    /// Map zoom level
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=22))]
    pub zoom: u8,

    /// Maximum clusters plus singles returned (defaults to configured limit)
    #[arg(long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub layers: LayerArgs,

    /// Print a GeoJSON FeatureCollection
    #[arg(long)]
    pub geojson: bool,
}

#[derive(Args, Debug)]
pub struct LayersArgs {
    #[command(subcommand)]
    pub command: LayersCommand,
}

#[derive(Subcommand, Debug)]
pub enum LayersCommand {
    /// List every layer
    List,

    /// Show one layer
    Get {
        id: String,
    },

    /// Create a layer, or replace its metadata if it exists
    Create(CreateLayerArgs),

    /// Show or hide a layer
    Visible {
        id: String,

        #[arg(action = clap::ArgAction::Set)]
        visible: bool,
    },

    /// Delete a layer and every artifact in it
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct CreateLayerArgs {
    pub id: String,

    /// Display name (defaults to the id)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Where the layer's data came from
    #[arg(long)]
    pub source: Option<String>,

    /// Create the layer hidden
    #[arg(long)]
    pub hidden: bool,

    /// Client styling as a JSON object
    #[arg(long, value_name = "JSON")]
    pub style: Option<String>,
}

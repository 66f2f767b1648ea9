//! Artmap Core - Domain models, errors, and configuration
//!
//! This crate contains the artifact, layer and query models shared by the
//! geometry engine, the storage adapters and the command-line front end.

pub mod config;
pub mod error;
pub mod models;

pub use error::{ArtmapError, Result};

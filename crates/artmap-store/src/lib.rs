//! Artmap Store - Artifact storage port and adapters
//!
//! This crate defines the [`ports::ArtifactStore`] contract and provides an
//! in-process adapter backed by a spatial index and a PostgreSQL/PostGIS
//! adapter issuing the equivalent spatial predicates.

pub mod memory;
pub mod ports;
pub mod postgres;

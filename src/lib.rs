//! Parcel: package migrations for content stores
//!
//! This crate provides the main Parcel library, re-exporting core types from
//! `parcel-core` and organizing the manifest resolver, the package installer
//! and the migration runner.

pub use parcel_core::{ErrorKind, ParcelError, ParcelResult, Version};

/// Core module re-exported from parcel-core.
pub mod core {
    pub use parcel_core::core::*;
    pub use parcel_core::*;

    /// Path module re-exported from parcel-core.
    pub mod path {
        pub use parcel_core::core::path::*;
    }
}

/// Configuration management.
pub mod config;

/// SQLite store and base schema.
pub mod db;

/// Dependency injection infrastructure.
pub mod di;

/// Package data manifests and their resolution.
pub mod manifest;

/// Migration plans, steps and the runner that applies them.
pub mod migration;

/// Package installation, media storage and repackaging.
pub mod package;

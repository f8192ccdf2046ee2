//! # pointcluster
//!
//! Clustered point layers for style-driven map engines.
//!
//! Raw coordinates become a GeoJSON feature collection, the collection is
//! wrapped in a clustering source, and three layers are derived from it:
//! circles for clusters, their member counts, and icons for individual
//! points. The rendering engine itself stays behind the
//! [`StyleRegistry`](traits::StyleRegistry) trait.

pub mod core;
pub mod data;
pub mod prelude;
pub mod rendering;
pub mod spatial;
pub mod style;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{ClusterOptions, ClusterStyle, PipelineConfig, StyleIds},
    geo::{LatLng, LatLngBounds},
    jitter::{jitter, scatter},
};

pub use data::{
    builder::FeatureCollectionBuilder,
    geojson::{decode_feature_collection, load_feature_collection, Feature, FeatureCollection},
};

pub use rendering::{
    pipeline::{ClusterPipeline, RenderReport},
    registry::MemoryStyle,
};

pub use spatial::{clustering::ClusterPreview, index::FeatureIndex};

pub use style::{
    composer::LayerComposer,
    expression::{Expression, StepExpression},
    layer::StyleLayer,
    source::{configure_source, ClusterSourceConfig},
};

pub use traits::StyleRegistry;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Registration error: {0}")]
    Registration(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Required asset not found: {0}")]
    MissingAsset(String),

    #[error("Style never finished loading")]
    StyleUnavailable,
}

/// Error type alias for convenience
pub type Error = MapError;

/// Initialises `env_logger` from `RUST_LOG`, once
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

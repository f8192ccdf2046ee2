//! Prelude module for common pointcluster types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use pointcluster::prelude::*;`

pub use crate::core::{
    config::{ClusterOptions, ClusterStyle, PipelineConfig, StyleIds},
    geo::{LatLng, LatLngBounds},
    jitter::{jitter, jitter_with, scatter, JitterDirection},
};

pub use crate::data::{
    builder::FeatureCollectionBuilder,
    geojson::{Feature, FeatureCollection, Properties},
};

pub use crate::spatial::{
    clustering::{Cluster, ClusterPreview, PreviewFeature},
    index::{FeatureIndex, SpatialIndex, SpatialItem},
};

pub use crate::style::{
    color::Color,
    composer::{ClusterLayers, LayerComposer},
    expression::{EvaluationContext, Expression, Interpolation, StepExpression},
    layer::{CircleLayer, LayerPosition, PropertyValue, StyleLayer, SymbolLayer},
    source::{configure_source, ClusterSourceConfig},
};

pub use crate::rendering::{
    pipeline::{AnnotationAnchor, ClusterPipeline, RegisteredItem, RenderReport},
    registry::MemoryStyle,
};

pub use crate::traits::{style_loaded, StyleRegistry};

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

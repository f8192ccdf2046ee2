pub mod config;
pub mod constants;
pub mod geo;
pub mod jitter;

pub use self::config::{ClusterOptions, ClusterStyle, PipelineConfig, StyleIds};
pub use self::geo::{LatLng, LatLngBounds};
pub use self::jitter::{jitter, jitter_with, scatter, JitterDirection};

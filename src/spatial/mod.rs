pub mod clustering;
pub mod index;

pub use self::clustering::{Cluster, ClusterPreview, PreviewFeature};
pub use self::index::{FeatureIndex, SpatialIndex, SpatialItem};

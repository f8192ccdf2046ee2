pub mod pipeline;
pub mod registry;

// Re-export main types
pub use self::pipeline::{
    AnnotationAnchor, ClusterPipeline, PreparedClusters, RegisteredItem, RegistrationOutcome,
    RenderReport,
};
pub use self::registry::MemoryStyle;

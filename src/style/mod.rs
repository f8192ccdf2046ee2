pub mod color;
pub mod composer;
pub mod expression;
pub mod layer;
pub mod source;

pub use self::color::Color;
pub use self::composer::{ClusterLayers, LayerComposer};
pub use self::expression::{
    EvaluationContext, Expression, InterpolateExpression, Interpolation, StepExpression,
};
pub use self::layer::{CircleLayer, LayerKind, LayerPosition, PropertyValue, StyleLayer, SymbolLayer};
pub use self::source::{configure_default_source, configure_source, ClusterSourceConfig};

//! Layer style composer
//!
//! Derives the three layers of a clustered point source:
//!
//! * a circle per cluster, sized and colored by member count,
//! * the member count drawn on top of each circle,
//! * an icon per individual point.
//!
//! Cluster layers filter on `has(point_count)` and the icon layer on its
//! negation, so every feature is drawn by exactly one of the two families.

use serde_json::Value;

use crate::core::config::{ClusterStyle, StyleIds};
use crate::style::expression::{Expression, StepExpression};
use crate::style::layer::{CircleLayer, LayerPosition, PropertyValue, StyleLayer, SymbolLayer};
use crate::Result;

/// The composed layers, with the position each one goes in
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLayers {
    pub cluster_circles: StyleLayer,
    pub cluster_counts: StyleLayer,
    pub unclustered_icons: StyleLayer,
}

impl ClusterLayers {
    /// Registration order with positions. The circle layer goes first, the
    /// icon layer slides in below it and the counts go on top without
    /// referring to the circles, so they land even if the circles do not.
    pub fn registration_order(&self) -> Vec<(&StyleLayer, LayerPosition)> {
        vec![
            (&self.cluster_circles, LayerPosition::Default),
            (
                &self.unclustered_icons,
                LayerPosition::Below(self.cluster_circles.id().to_string()),
            ),
            (&self.cluster_counts, LayerPosition::Default),
        ]
    }

    /// Bottom-to-top order the layers end up in
    pub fn stacked(&self) -> [&StyleLayer; 3] {
        [
            &self.unclustered_icons,
            &self.cluster_circles,
            &self.cluster_counts,
        ]
    }
}

/// Builds cluster layer descriptions from a [`ClusterStyle`]
#[derive(Debug, Clone, Default)]
pub struct LayerComposer {
    ids: StyleIds,
    style: ClusterStyle,
}

impl LayerComposer {
    pub fn new(ids: StyleIds, style: ClusterStyle) -> Result<Self> {
        ids.validate()?;
        style.validate()?;
        Ok(Self { ids, style })
    }

    pub fn ids(&self) -> &StyleIds {
        &self.ids
    }

    pub fn style(&self) -> &ClusterStyle {
        &self.style
    }

    /// Matches cluster features only
    pub fn cluster_filter(&self) -> Expression {
        Expression::has(&self.ids.point_count)
    }

    /// Matches individual features only
    pub fn unclustered_filter(&self) -> Expression {
        Expression::not(self.cluster_filter())
    }

    fn count_step<V: Into<Value> + Clone>(&self, outputs: &[V]) -> Result<StepExpression> {
        StepExpression::from_bands(
            Expression::get(&self.ids.point_count),
            &self.style.breakpoints,
            outputs,
        )
    }

    pub fn cluster_circle_layer(&self, source_id: &str) -> Result<CircleLayer> {
        let colors: Vec<Value> = self
            .style
            .circle_colors
            .iter()
            .map(|c| Value::String(c.to_string()))
            .collect();

        let mut layer = CircleLayer::new(&self.ids.cluster_circle_layer, source_id);
        layer.filter = Some(self.cluster_filter());
        layer.circle_color = Some(self.count_step(&colors)?.into());
        layer.circle_radius = Some(self.count_step(&self.style.circle_radii)?.into());
        layer.circle_stroke_width = Some(PropertyValue::constant(self.style.stroke_width));
        layer.circle_stroke_color = Some(PropertyValue::color(self.style.stroke_color()));
        Ok(layer)
    }

    pub fn cluster_count_layer(&self, source_id: &str) -> Result<SymbolLayer> {
        let mut layer = SymbolLayer::new(&self.ids.cluster_count_layer, source_id);
        layer.filter = Some(self.cluster_filter());
        layer.text_field = Some(Expression::get(&self.ids.point_count).into());
        layer.text_size = Some(self.count_step(&self.style.text_sizes)?.into());
        layer.text_font = Some(PropertyValue::constant(self.style.text_font.clone()));
        layer.text_color = Some(PropertyValue::color(self.style.text_color));
        Ok(layer)
    }

    pub fn unclustered_marker_layer(&self, source_id: &str) -> SymbolLayer {
        let mut layer = SymbolLayer::new(&self.ids.unclustered_icon_layer, source_id);
        layer.filter = Some(self.unclustered_filter());
        layer.icon_image = Some(PropertyValue::constant(self.style.icon_image.clone()));
        layer.icon_size = Some(PropertyValue::constant(self.style.icon_size));
        layer
    }

    /// All three layers for `source_id`
    pub fn compose(&self, source_id: &str) -> Result<ClusterLayers> {
        Ok(ClusterLayers {
            cluster_circles: self.cluster_circle_layer(source_id)?.into(),
            cluster_counts: self.cluster_count_layer(source_id)?.into(),
            unclustered_icons: self.unclustered_marker_layer(source_id).into(),
        })
    }
}

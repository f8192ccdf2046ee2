//! Configuration for the clustering pipeline
//!
//! This module groups the identifiers, clustering parameters and styling
//! constants the pipeline needs into plain serde structs. Every field has a
//! default, so a partial JSON document only needs to name what it overrides.

use serde::{Deserialize, Serialize};

use crate::core::constants::*;
use crate::style::color::Color;
use crate::{MapError, Result};

/// Identifiers the pipeline registers with the host style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleIds {
    pub source: String,
    pub cluster_circle_layer: String,
    pub cluster_count_layer: String,
    pub unclustered_icon_layer: String,
    /// Feature property carrying the member count of a cluster
    pub point_count: String,
    /// Prefix of the generated feature ids
    pub feature_prefix: String,
}

impl Default for StyleIds {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_ID.to_string(),
            cluster_circle_layer: CLUSTER_CIRCLE_LAYER_ID.to_string(),
            cluster_count_layer: CLUSTER_COUNT_LAYER_ID.to_string(),
            unclustered_icon_layer: UNCLUSTERED_ICON_LAYER_ID.to_string(),
            point_count: POINT_COUNT_PROPERTY.to_string(),
            feature_prefix: VIEW_ANNOTATION_PREFIX.to_string(),
        }
    }
}

impl StyleIds {
    /// Layer ids in the order they end up in the style stack, bottom first
    pub fn layer_ids(&self) -> [&str; 3] {
        [
            &self.unclustered_icon_layer,
            &self.cluster_circle_layer,
            &self.cluster_count_layer,
        ]
    }

    pub fn validate(&self) -> Result<()> {
        let named = [
            ("source", &self.source),
            ("cluster_circle_layer", &self.cluster_circle_layer),
            ("cluster_count_layer", &self.cluster_count_layer),
            ("unclustered_icon_layer", &self.unclustered_icon_layer),
            ("point_count", &self.point_count),
        ];
        if let Some((name, _)) = named.iter().find(|(_, value)| value.is_empty()) {
            return Err(MapError::Config(format!("identifier '{}' is empty", name)));
        }

        let layers = self.layer_ids();
        for (i, id) in layers.iter().enumerate() {
            if layers[i + 1..].contains(id) {
                return Err(MapError::Config(format!("layer id '{}' is used twice", id)));
            }
        }
        Ok(())
    }
}

/// Clustering parameters of the GeoJSON source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    pub enabled: bool,
    /// Radius of each cluster in screen pixels
    pub radius: i32,
    /// Highest zoom level at which points are still clustered
    pub max_zoom: i32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: DEFAULT_CLUSTER_RADIUS,
            max_zoom: DEFAULT_CLUSTER_MAX_ZOOM,
        }
    }
}

impl ClusterOptions {
    pub fn validate(&self) -> Result<()> {
        if self.radius <= 0 {
            return Err(MapError::Config(format!(
                "cluster radius must be positive, got {}",
                self.radius
            )));
        }
        if self.max_zoom < 0 {
            return Err(MapError::Config(format!(
                "cluster max zoom must not be negative, got {}",
                self.max_zoom
            )));
        }
        Ok(())
    }
}

/// Paint and layout constants of the three cluster layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterStyle {
    pub base_color: Color,
    /// Point-count thresholds; `n` breakpoints give `n + 1` bands
    pub breakpoints: Vec<f64>,
    /// Circle radius per band
    pub circle_radii: Vec<f64>,
    /// Circle color per band
    pub circle_colors: Vec<Color>,
    pub stroke_width: f64,
    pub stroke_alpha: f32,
    /// Label size per band
    pub text_sizes: Vec<f64>,
    pub text_font: Vec<String>,
    pub text_color: Color,
    pub icon_image: String,
    pub icon_size: f64,
}

impl Default for ClusterStyle {
    fn default() -> Self {
        Self {
            base_color: Color::BLUE,
            breakpoints: CLUSTER_BREAKPOINTS.to_vec(),
            circle_radii: CLUSTER_CIRCLE_RADII.to_vec(),
            circle_colors: vec![Color::BLUE; CLUSTER_CIRCLE_RADII.len()],
            stroke_width: CLUSTER_STROKE_WIDTH,
            stroke_alpha: CLUSTER_STROKE_ALPHA,
            text_sizes: CLUSTER_TEXT_SIZES.to_vec(),
            text_font: vec![CLUSTER_COUNT_FONT.to_string()],
            text_color: Color::WHITE,
            icon_image: UNCLUSTERED_ICON_IMAGE.to_string(),
            icon_size: UNCLUSTERED_ICON_SIZE,
        }
    }
}

impl ClusterStyle {
    /// Stroke color of the cluster circles
    pub fn stroke_color(&self) -> Color {
        self.base_color.with_alpha(self.stroke_alpha)
    }

    pub fn validate(&self) -> Result<()> {
        if self.breakpoints.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MapError::Config(
                "cluster breakpoints must be strictly increasing".to_string(),
            ));
        }

        let bands = self.breakpoints.len() + 1;
        let per_band = [
            ("circle_radii", self.circle_radii.len()),
            ("circle_colors", self.circle_colors.len()),
            ("text_sizes", self.text_sizes.len()),
        ];
        for (name, len) in per_band {
            if len != bands {
                return Err(MapError::Config(format!(
                    "{} needs {} values for {} breakpoints, got {}",
                    name,
                    bands,
                    self.breakpoints.len(),
                    len
                )));
            }
        }
        Ok(())
    }
}

/// Complete configuration of a clustering pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ids: StyleIds,
    pub cluster: ClusterOptions,
    pub style: ClusterStyle,
}

impl PipelineConfig {
    /// Parses a (possibly partial) JSON configuration and validates it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.ids.validate()?;
        self.cluster.validate()?;
        self.style.validate()
    }
}

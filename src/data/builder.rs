use crate::core::{constants::VIEW_ANNOTATION_PREFIX, geo::LatLng};
use crate::data::geojson::{Feature, FeatureCollection, Properties};

type PropertiesFn = Box<dyn Fn(usize, &LatLng) -> Option<Properties> + Send + Sync>;

/// Turns an ordered list of coordinates into point features whose ids are
/// `prefix + index`, so overlays can find the feature for input `i` again.
pub struct FeatureCollectionBuilder {
    prefix: String,
    properties: Option<PropertiesFn>,
}

impl FeatureCollectionBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            properties: None,
        }
    }

    /// Attaches properties to each feature. Returning `None` leaves the
    /// feature without properties.
    pub fn with_properties<F>(mut self, properties: F) -> Self
    where
        F: Fn(usize, &LatLng) -> Option<Properties> + Send + Sync + 'static,
    {
        self.properties = Some(Box::new(properties));
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Id of the feature built from input index `index`
    pub fn feature_id(&self, index: usize) -> String {
        format!("{}{}", self.prefix, index)
    }

    pub fn build(&self, points: &[LatLng]) -> FeatureCollection {
        points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let feature = Feature::new(self.feature_id(index), *point);
                match self.properties.as_ref().and_then(|f| f(index, point)) {
                    Some(properties) => feature.with_properties(properties),
                    None => feature,
                }
            })
            .collect()
    }
}

impl Default for FeatureCollectionBuilder {
    fn default() -> Self {
        Self::new(VIEW_ANNOTATION_PREFIX)
    }
}

impl std::fmt::Debug for FeatureCollectionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureCollectionBuilder")
            .field("prefix", &self.prefix)
            .field("properties", &self.properties.is_some())
            .finish()
    }
}

/// Builds a collection with the default annotation prefix
pub fn build(points: &[LatLng]) -> FeatureCollection {
    FeatureCollectionBuilder::default().build(points)
}

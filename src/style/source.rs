use serde_json::{json, Value};

use crate::core::config::ClusterOptions;
use crate::data::geojson::FeatureCollection;
use crate::Result;

/// A clustering GeoJSON source, ready to be registered with a style
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSourceConfig {
    pub data: FeatureCollection,
    pub cluster: bool,
    /// Cluster radius in screen pixels
    pub cluster_radius: i32,
    /// Highest zoom at which points are clustered
    pub cluster_max_zoom: i32,
}

impl ClusterSourceConfig {
    pub fn options(&self) -> ClusterOptions {
        ClusterOptions {
            enabled: self.cluster,
            radius: self.cluster_radius,
            max_zoom: self.cluster_max_zoom,
        }
    }

    /// Style-spec JSON form of the source
    pub fn to_style_json(&self) -> Value {
        json!({
            "type": "geojson",
            "data": self.data.to_geojson(),
            "cluster": self.cluster,
            "clusterRadius": self.cluster_radius,
            "clusterMaxZoom": self.cluster_max_zoom,
        })
    }
}

/// Wraps `features` in a clustering source.
///
/// Fails with [`crate::MapError::Config`] when the radius is not positive or
/// the max zoom is negative; values are never clamped.
pub fn configure_source(
    features: FeatureCollection,
    radius: i32,
    max_zoom: i32,
) -> Result<ClusterSourceConfig> {
    configure_source_with(
        features,
        ClusterOptions {
            enabled: true,
            radius,
            max_zoom,
        },
    )
}

/// Same as [`configure_source`], taking the full option set
pub fn configure_source_with(
    features: FeatureCollection,
    options: ClusterOptions,
) -> Result<ClusterSourceConfig> {
    options.validate()?;
    Ok(ClusterSourceConfig {
        data: features,
        cluster: options.enabled,
        cluster_radius: options.radius,
        cluster_max_zoom: options.max_zoom,
    })
}

/// [`configure_source`] with the default radius (150) and max zoom (10)
pub fn configure_default_source(features: FeatureCollection) -> ClusterSourceConfig {
    let options = ClusterOptions::default();
    ClusterSourceConfig {
        data: features,
        cluster: options.enabled,
        cluster_radius: options.radius,
        cluster_max_zoom: options.max_zoom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::data::builder::build;
    use crate::MapError;

    #[test]
    fn test_defaults() {
        let source = configure_default_source(FeatureCollection::empty());
        assert!(source.cluster);
        assert_eq!(source.cluster_radius, 150);
        assert_eq!(source.cluster_max_zoom, 10);
    }

    #[test]
    fn test_valid_parameters() {
        for (radius, max_zoom) in [(1, 0), (150, 10), (500, 22)] {
            let source = configure_source(FeatureCollection::empty(), radius, max_zoom).unwrap();
            assert_eq!(source.cluster_radius, radius);
            assert_eq!(source.cluster_max_zoom, max_zoom);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        for (radius, max_zoom) in [(0, 10), (-5, 10), (150, -1)] {
            let err = configure_source(FeatureCollection::empty(), radius, max_zoom).unwrap_err();
            assert!(matches!(err, MapError::Config(_)), "{} / {}", radius, max_zoom);
        }
    }

    #[test]
    fn test_style_json() {
        let source = configure_source(build(&[LatLng::new(1.0, 2.0)]), 50, 14).unwrap();
        let json = source.to_style_json();
        assert_eq!(json["type"], "geojson");
        assert_eq!(json["cluster"], true);
        assert_eq!(json["clusterRadius"], 50);
        assert_eq!(json["clusterMaxZoom"], 14);
        assert_eq!(json["data"]["features"][0]["id"], "view_annotation_0");
    }
}

//! Cluster preview
//!
//! Reproduces the grouping a style engine's clustered GeoJSON source performs
//! at a single zoom level, so the styling rules can be checked against real
//! cluster features without a running engine.

use serde_json::{json, Value};

use crate::{
    core::{
        config::ClusterOptions,
        constants::POINT_COUNT_PROPERTY,
        geo::{LatLng, LatLngBounds},
    },
    data::geojson::{Feature, FeatureCollection, Properties},
    spatial::index::{SpatialIndex, SpatialItem},
};

/// Represents a cluster of point features
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Sequential id, unique within one preview run
    pub id: u64,
    /// Mean position of the members
    pub center: LatLng,
    /// Geographic bounds of the members
    pub bounds: LatLngBounds,
    /// Ids of the member features, in input order
    pub members: Vec<String>,
    /// Zoom level at which this cluster was formed
    pub zoom_level: f64,
}

impl Cluster {
    /// Get the number of items in the cluster
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Feature the engine would emit for this cluster
    pub fn to_feature(&self, point_count_property: &str) -> Feature {
        let mut properties = Properties::new();
        properties.insert("cluster".to_string(), Value::Bool(true));
        properties.insert("cluster_id".to_string(), json!(self.id));
        properties.insert(point_count_property.to_string(), json!(self.count()));
        properties.insert(
            format!("{}_abbreviated", point_count_property),
            Value::String(abbreviate(self.count())),
        );
        Feature::new(format!("cluster_{}", self.id), self.center).with_properties(properties)
    }
}

/// Short count label, `1.2k` style above a thousand
pub fn abbreviate(count: usize) -> String {
    if count >= 10_000 {
        format!("{}k", (count as f64 / 1000.0).round())
    } else if count >= 1000 {
        format!("{}k", (count as f64 / 100.0).round() / 10.0)
    } else {
        count.to_string()
    }
}

/// One rendered element of a preview
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewFeature {
    Cluster(Cluster),
    Point(Feature),
}

impl PreviewFeature {
    pub fn is_cluster(&self) -> bool {
        matches!(self, PreviewFeature::Cluster(_))
    }

    pub fn to_feature(&self, point_count_property: &str) -> Feature {
        match self {
            PreviewFeature::Cluster(cluster) => cluster.to_feature(point_count_property),
            PreviewFeature::Point(feature) => feature.clone(),
        }
    }
}

/// Greedy radius clustering in web-mercator pixel space
#[derive(Debug, Clone)]
pub struct ClusterPreview {
    options: ClusterOptions,
    point_count_property: String,
}

impl ClusterPreview {
    pub fn new(options: ClusterOptions) -> Self {
        Self {
            options,
            point_count_property: POINT_COUNT_PROPERTY.to_string(),
        }
    }

    pub fn with_point_count_property(mut self, property: impl Into<String>) -> Self {
        self.point_count_property = property.into();
        self
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Whether points are grouped at this zoom level
    pub fn clusters_at_zoom(&self, zoom: f64) -> bool {
        self.options.enabled && zoom.floor() <= self.options.max_zoom as f64
    }

    /// Groups the collection as it would appear at `zoom`.
    ///
    /// Points are visited in input order; each unvisited point absorbs every
    /// unvisited neighbour within the cluster radius. Groups of one stay
    /// plain points.
    pub fn run(&self, collection: &FeatureCollection, zoom: f64) -> Vec<PreviewFeature> {
        if !self.clusters_at_zoom(zoom) {
            return collection
                .iter()
                .cloned()
                .map(PreviewFeature::Point)
                .collect();
        }

        let zoom_level = zoom.floor();
        let items = collection
            .iter()
            .enumerate()
            .map(|(i, f)| SpatialItem::new(f.id.clone(), f.geometry.to_world_pixels(zoom_level), i))
            .collect();
        let index = SpatialIndex::bulk_load(items);

        let mut visited = vec![false; collection.len()];
        let mut output = Vec::new();
        let mut next_id = 0u64;

        for (i, feature) in collection.iter().enumerate() {
            if visited[i] {
                continue;
            }
            visited[i] = true;

            let origin = feature.geometry.to_world_pixels(zoom_level);
            let mut members: Vec<usize> = index
                .query_radius(origin, self.options.radius as f64)
                .into_iter()
                .map(|item| item.data)
                .filter(|&j| !visited[j])
                .collect();

            if members.is_empty() {
                output.push(PreviewFeature::Point(feature.clone()));
                continue;
            }

            members.push(i);
            members.sort_unstable();
            for &j in &members {
                visited[j] = true;
            }

            let features = collection.features();
            let first = features[members[0]].geometry;
            let mut bounds = LatLngBounds::new(first, first);
            let (mut lat_sum, mut lng_sum) = (0.0, 0.0);
            for &j in &members {
                let geometry = features[j].geometry;
                bounds.extend(&geometry);
                lat_sum += geometry.lat;
                lng_sum += geometry.lng;
            }
            let n = members.len() as f64;

            output.push(PreviewFeature::Cluster(Cluster {
                id: next_id,
                center: LatLng::new(lat_sum / n, lng_sum / n),
                bounds,
                members: members.iter().map(|&j| features[j].id.clone()).collect(),
                zoom_level,
            }));
            next_id += 1;
        }

        output
    }

    /// Same as [`run`](Self::run), flattened to the features the engine emits
    pub fn features(&self, collection: &FeatureCollection, zoom: f64) -> Vec<Feature> {
        self.run(collection, zoom)
            .iter()
            .map(|f| f.to_feature(&self.point_count_property))
            .collect()
    }
}

impl Default for ClusterPreview {
    fn default() -> Self {
        Self::new(ClusterOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::builder::build;

    fn denali() -> FeatureCollection {
        build(&[
            LatLng::new(63.1224, -150.4048),
            LatLng::new(63.1016, -151.5129),
            LatLng::new(63.0781, -151.3597),
            LatLng::new(12.0623, -87.6901),
        ])
    }

    #[test]
    fn test_low_zoom_groups_nearby_points() {
        let preview = ClusterPreview::default();
        let output = preview.run(&denali(), 2.0);
        assert_eq!(output.len(), 2);

        let PreviewFeature::Cluster(cluster) = &output[0] else {
            panic!("expected a cluster first, got {:?}", output[0]);
        };
        assert_eq!(cluster.count(), 3);
        assert_eq!(
            cluster.members,
            vec!["view_annotation_0", "view_annotation_1", "view_annotation_2"]
        );
        assert!(cluster.bounds.contains(&cluster.center));
        assert!(!output[1].is_cluster());
    }

    #[test]
    fn test_above_max_zoom_nothing_clusters() {
        let preview = ClusterPreview::default();
        let output = preview.run(&denali(), 11.0);
        assert_eq!(output.len(), 4);
        assert!(output.iter().all(|f| !f.is_cluster()));
        assert!(preview.clusters_at_zoom(10.9));
    }

    #[test]
    fn test_disabled_clustering() {
        let preview = ClusterPreview::new(ClusterOptions {
            enabled: false,
            ..Default::default()
        });
        assert!(preview.run(&denali(), 0.0).iter().all(|f| !f.is_cluster()));
    }

    #[test]
    fn test_cluster_feature_properties() {
        let preview = ClusterPreview::default();
        let features = preview.features(&denali(), 2.0);
        assert_eq!(features[0].property("point_count"), Some(&json!(3)));
        assert_eq!(features[0].property("cluster"), Some(&json!(true)));
        assert_eq!(
            features[0].property("point_count_abbreviated"),
            Some(&json!("3"))
        );
        assert!(features[1].property("point_count").is_none());
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate(999), "999");
        assert_eq!(abbreviate(1234), "1.2k");
        assert_eq!(abbreviate(15_500), "16k");
    }
}

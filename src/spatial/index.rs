use crate::{
    core::geo::{LatLng, LatLngBounds},
    data::geojson::FeatureCollection,
};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A point that can be indexed via an R-tree
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    pub position: [f64; 2],
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: String, position: [f64; 2], data: T) -> Self {
        Self { id, position, data }
    }

    /// Indexes a geographic coordinate as `[lng, lat]`
    pub fn from_lat_lng(id: String, lat_lng: LatLng, data: T) -> Self {
        Self::new(id, lat_lng.to_position(), data)
    }
}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree based point index
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> SpatialIndex<T> {
    /// Builds a balanced tree from all items at once
    pub fn bulk_load(items: Vec<SpatialItem<T>>) -> Self {
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    /// Items whose position lies inside the envelope spanned by `min`/`max`
    pub fn query(&self, min: [f64; 2], max: [f64; 2]) -> Vec<&SpatialItem<T>> {
        let envelope = AABB::from_corners(min, max);
        self.rtree.locate_in_envelope(&envelope).collect()
    }

    /// Items within `radius` (in index units) of `center`
    pub fn query_radius(&self, center: [f64; 2], radius: f64) -> Vec<&SpatialItem<T>> {
        self.rtree
            .locate_within_distance(center, radius * radius)
            .collect()
    }

    pub fn nearest(&self, point: [f64; 2]) -> Option<&SpatialItem<T>> {
        self.rtree.nearest_neighbor(&point)
    }

    pub fn get(&self, id: &str) -> Option<&SpatialItem<T>> {
        self.rtree.iter().find(|item| item.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }
}

/// Geographic index over a feature collection; item data is the feature's
/// position in the collection.
pub struct FeatureIndex {
    index: SpatialIndex<usize>,
}

impl FeatureIndex {
    pub fn new(collection: &FeatureCollection) -> Self {
        let items = collection
            .iter()
            .enumerate()
            .map(|(i, f)| SpatialItem::from_lat_lng(f.id.clone(), f.geometry, i))
            .collect();
        Self {
            index: SpatialIndex::bulk_load(items),
        }
    }

    /// Collection index of the feature with this id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).map(|item| item.data)
    }

    /// Coordinate of the feature with this id
    pub fn anchor(&self, id: &str) -> Option<LatLng> {
        self.index
            .get(id)
            .map(|item| LatLng::from_position(item.position))
    }

    pub fn within_bounds(&self, bounds: &LatLngBounds) -> Vec<&str> {
        let [west, south, east, north] = bounds.to_bbox();
        self.index
            .query([west, south], [east, north])
            .into_iter()
            .map(|item| item.id.as_str())
            .collect()
    }

    /// Ids within `meters` of `center`, by great-circle distance
    pub fn within_meters(&self, center: LatLng, meters: f64) -> Vec<&str> {
        // Generous degree window first, exact distance second
        let lat_window = meters / 111_000.0;
        let lng_window = lat_window / center.lat.to_radians().cos().abs().max(1e-6);
        let window = lat_window.max(lng_window);
        self.index
            .query_radius(center.to_position(), window)
            .into_iter()
            .filter(|item| center.distance_to(&LatLng::from_position(item.position)) <= meters)
            .map(|item| item.id.as_str())
            .collect()
    }

    pub fn nearest(&self, point: LatLng) -> Option<&str> {
        self.index
            .nearest(point.to_position())
            .map(|item| item.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::builder::build;

    fn alaska() -> FeatureCollection {
        build(&[
            LatLng::new(63.1224, -150.4048),
            LatLng::new(63.1016, -151.5129),
            LatLng::new(34.299667, -118.497),
        ])
    }

    #[test]
    fn test_anchor_lookup() {
        let index = FeatureIndex::new(&alaska());
        assert_eq!(index.len(), 3);
        assert_eq!(index.position_of("view_annotation_2"), Some(2));
        assert_eq!(
            index.anchor("view_annotation_1"),
            Some(LatLng::new(63.1016, -151.5129))
        );
        assert!(index.anchor("view_annotation_9").is_none());
    }

    #[test]
    fn test_within_bounds() {
        let index = FeatureIndex::new(&alaska());
        let mut ids = index.within_bounds(&LatLngBounds::from_coords(60.0, -155.0, 65.0, -145.0));
        ids.sort();
        assert_eq!(ids, vec!["view_annotation_0", "view_annotation_1"]);
    }

    #[test]
    fn test_within_meters() {
        let index = FeatureIndex::new(&alaska());
        // The two Alaskan points are roughly 56 km apart
        let near = index.within_meters(LatLng::new(63.1224, -150.4048), 10_000.0);
        assert_eq!(near, vec!["view_annotation_0"]);
        let mut wide = index.within_meters(LatLng::new(63.1224, -150.4048), 80_000.0);
        wide.sort();
        assert_eq!(wide, vec!["view_annotation_0", "view_annotation_1"]);
    }

    #[test]
    fn test_nearest() {
        let index = FeatureIndex::new(&alaska());
        assert_eq!(
            index.nearest(LatLng::new(35.0, -119.0)),
            Some("view_annotation_2")
        );
    }

    #[test]
    fn test_query_radius_is_euclidean() {
        let index = SpatialIndex::bulk_load(vec![
            SpatialItem::new("a".to_string(), [0.0, 0.0], ()),
            SpatialItem::new("b".to_string(), [3.0, 4.0], ()),
        ]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.query_radius([0.0, 0.0], 5.0).len(), 2);
        assert_eq!(index.query_radius([0.0, 0.0], 4.9).len(), 1);
        assert_eq!(index.get("b").map(|item| item.position), Some([3.0, 4.0]));
    }
}

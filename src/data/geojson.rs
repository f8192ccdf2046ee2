use crate::core::constants::VIEW_ANNOTATION_PREFIX;
use crate::core::geo::{LatLng, LatLngBounds};
use crate::prelude::HashSet;
use crate::{MapError, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Free-form feature properties
pub type Properties = Map<String, Value>;

/// A point feature with a stable string identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub geometry: LatLng,
    pub properties: Option<Properties>,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: LatLng) -> Self {
        Self {
            id: id.into(),
            geometry,
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Looks up a property value
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    /// RFC 7946 representation
    pub fn to_geojson(&self) -> Value {
        let mut feature = json!({
            "type": "Feature",
            "id": self.id,
            "geometry": {
                "type": "Point",
                "coordinates": self.geometry.to_position(),
            },
        });
        if let Some(properties) = &self.properties {
            feature["properties"] = Value::Object(properties.clone());
        } else {
            feature["properties"] = Value::Null;
        }
        feature
    }
}

/// Ordered collection of point features
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature ids in collection order
    pub fn ids(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Gets the bounding box of all features
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let mut iter = self.features.iter();
        let first = iter.next()?.geometry;
        let mut bounds = LatLngBounds::new(first, first);
        for feature in iter {
            bounds.extend(&feature.geometry);
        }
        Some(bounds)
    }

    /// RFC 7946 representation
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": self.features.iter().map(Feature::to_geojson).collect::<Vec<_>>(),
        })
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// --- decoding ------------------------------------------------------------------------------------

/// GeoJSON geometry as found in input files
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
    LineString { coordinates: Value },
    Polygon { coordinates: Value },
    MultiLineString { coordinates: Value },
    MultiPolygon { coordinates: Value },
    GeometryCollection { geometries: Vec<GeoJsonGeometry> },
}

#[derive(Debug, Clone, Deserialize)]
struct GeoJsonFeature {
    #[serde(default)]
    id: Option<Value>,
    geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeoJsonFeatureCollection {
    features: Vec<GeoJsonFeature>,
}

impl GeoJsonGeometry {
    fn kind(&self) -> &'static str {
        match self {
            GeoJsonGeometry::Point { .. } => "Point",
            GeoJsonGeometry::MultiPoint { .. } => "MultiPoint",
            GeoJsonGeometry::LineString { .. } => "LineString",
            GeoJsonGeometry::Polygon { .. } => "Polygon",
            GeoJsonGeometry::MultiLineString { .. } => "MultiLineString",
            GeoJsonGeometry::MultiPolygon { .. } => "MultiPolygon",
            GeoJsonGeometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}

fn position(coords: &[f64]) -> Result<LatLng> {
    match coords {
        [lng, lat, ..] => Ok(LatLng::new(*lat, *lng)),
        _ => Err(MapError::Decode(format!(
            "position needs at least two values, got {}",
            coords.len()
        ))),
    }
}

fn collect_points(geometry: &GeoJsonGeometry, out: &mut Vec<LatLng>) -> Result<()> {
    match geometry {
        GeoJsonGeometry::Point { coordinates } => out.push(position(coordinates)?),
        GeoJsonGeometry::MultiPoint { coordinates } => {
            for coords in coordinates {
                out.push(position(coords)?);
            }
        }
        GeoJsonGeometry::GeometryCollection { geometries } => {
            for child in geometries {
                collect_points(child, out)?;
            }
        }
        other => log::debug!("skipping {} geometry", other.kind()),
    }
    Ok(())
}

fn explicit_id(id: Option<&Value>) -> Option<String> {
    match id {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// First prefixed id at or after `index` that no feature claims explicitly
fn fallback_id(mut index: usize, reserved: &HashSet<String>, seen: &HashSet<String>) -> String {
    loop {
        let id = format!("{}{}", VIEW_ANNOTATION_PREFIX, index);
        if !reserved.contains(&id) && !seen.contains(&id) {
            return id;
        }
        index += 1;
    }
}

/// Decodes a GeoJSON document into point features.
///
/// Multi-point geometries contribute one feature per position (suffixed
/// `-<n>`). Non-point geometries are skipped. Features without an id get
/// the annotation prefix plus their output index, skipping indices whose
/// id another feature already carries.
pub fn decode_feature_collection(json: &str) -> Result<FeatureCollection> {
    let invalid = |e: serde_json::Error| MapError::Decode(format!("invalid GeoJSON: {}", e));
    let root: Value = serde_json::from_str(json).map_err(invalid)?;

    let kind = root.get("type").and_then(Value::as_str).map(str::to_owned);

    let raw_features = match kind.as_deref() {
        Some("FeatureCollection") => {
            serde_json::from_value::<GeoJsonFeatureCollection>(root)
                .map_err(invalid)?
                .features
        }
        Some("Feature") => vec![serde_json::from_value(root).map_err(invalid)?],
        Some(_) => vec![GeoJsonFeature {
            id: None,
            geometry: Some(serde_json::from_value(root).map_err(invalid)?),
            properties: None,
        }],
        None => {
            return Err(MapError::Decode(
                "GeoJSON object has no \"type\" member".to_string(),
            ))
        }
    };

    let reserved: HashSet<String> = raw_features
        .iter()
        .filter_map(|raw| explicit_id(raw.id.as_ref()))
        .collect();

    let mut collection = FeatureCollection::empty();
    let mut seen = HashSet::default();
    for raw in raw_features {
        let Some(geometry) = raw.geometry.as_ref() else {
            continue;
        };
        let mut points = Vec::new();
        collect_points(geometry, &mut points)?;

        let base_id = explicit_id(raw.id.as_ref())
            .unwrap_or_else(|| fallback_id(collection.len(), &reserved, &seen));
        let multi = points.len() > 1;
        for (n, point) in points.into_iter().enumerate() {
            let id = if multi {
                format!("{}-{}", base_id, n)
            } else {
                base_id.clone()
            };
            if !seen.insert(id.clone()) {
                return Err(MapError::Decode(format!("duplicate feature id '{}'", id)));
            }
            collection.push(Feature {
                id,
                geometry: point,
                properties: raw.properties.clone(),
            });
        }
    }
    Ok(collection)
}

/// Loads a bundled GeoJSON file.
///
/// A missing file is a broken precondition and fails with
/// [`MapError::MissingAsset`]. A file that exists but cannot be read or
/// decoded is logged and yields an empty collection.
pub fn load_feature_collection(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MapError::MissingAsset(path.display().to_string()));
    }

    let decoded = std::fs::read(path)
        .map_err(MapError::from)
        .and_then(|bytes| {
            String::from_utf8(bytes)
                .map_err(|e| MapError::Decode(format!("file is not UTF-8: {}", e)))
        })
        .and_then(|contents| decode_feature_collection(&contents));
    match decoded {
        Ok(collection) => {
            log::debug!("loaded {} features from {}", collection.len(), path.display());
            Ok(collection)
        }
        Err(e) => {
            log::error!("Error parsing data in {}: {}", path.display(), e);
            Ok(FeatureCollection::empty())
        }
    }
}

//! Core constants for the clustered point layer.
//! Keeping them in a single place makes it easier to tweak the magic numbers
//! shared by the source, the layers and the demo driver.

/// Source id the pipeline registers its clustered GeoJSON source under.
pub const DEFAULT_SOURCE_ID: &str = "pilot-source";

/// Circle layer drawing aggregated clusters.
pub const CLUSTER_CIRCLE_LAYER_ID: &str = "clusteredLayerIdentifier";

/// Symbol layer drawing the member count on top of each cluster.
pub const CLUSTER_COUNT_LAYER_ID: &str = "clusteredCountLayerIdentifier";

/// Symbol layer drawing individual (unclustered) points as icons.
pub const UNCLUSTERED_ICON_LAYER_ID: &str = "unclusteredImageLayerIdentifier";

/// Property the host engine attaches to every cluster feature.
pub const POINT_COUNT_PROPERTY: &str = "point_count";

/// Prefix of generated feature ids; the suffix is the input index.
pub const VIEW_ANNOTATION_PREFIX: &str = "view_annotation_";

/// Default clustering radius in screen pixels.
pub const DEFAULT_CLUSTER_RADIUS: i32 = 150;

/// Default zoom level above which points are no longer clustered.
pub const DEFAULT_CLUSTER_MAX_ZOOM: i32 = 10;

/// Degrees per meter, from the 1 km ≈ 0.00900900900901° approximation.
pub const DEGREES_PER_METER: f64 = 0.00900900900901 / 1000.0;

/// Point-count breakpoints separating small, medium and large clusters.
pub const CLUSTER_BREAKPOINTS: [f64; 2] = [9.0, 99.0];

/// Circle radius for each cluster band.
pub const CLUSTER_CIRCLE_RADII: [f64; 3] = [16.0, 24.0, 40.0];

/// Count label text size for each cluster band.
pub const CLUSTER_TEXT_SIZES: [f64; 3] = [14.0, 18.0, 30.0];

/// Cluster circle stroke width in pixels.
pub const CLUSTER_STROKE_WIDTH: f64 = 4.0;

/// Opacity applied to the base color for the cluster stroke.
pub const CLUSTER_STROKE_ALPHA: f32 = 0.4;

/// Font stack of the count label.
pub const CLUSTER_COUNT_FONT: &str = "Montserrat Bold";

/// Sprite drawn for unclustered points.
pub const UNCLUSTERED_ICON_IMAGE: &str = "fire-station-11";

/// Icon scale relative to the sprite's native size.
pub const UNCLUSTERED_ICON_SIZE: f64 = 0.1;

/// Tile extent (pixels) of the host engine's GeoJSON source at zoom 0.
pub const GEOJSON_TILE_SIZE: f64 = 512.0;

pub mod builder;
pub mod geojson;

pub use self::builder::{build, FeatureCollectionBuilder};
pub use self::geojson::{
    decode_feature_collection, load_feature_collection, Feature, FeatureCollection, Properties,
};

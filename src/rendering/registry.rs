use serde_json::{json, Map, Value};

use crate::prelude::HashMap;
use crate::style::layer::{LayerPosition, StyleLayer};
use crate::style::source::ClusterSourceConfig;
use crate::traits::{StyleLoadedCallback, StyleRegistry};
use crate::{MapError, Result};

/// In-memory style, standing in for a rendering engine.
///
/// Rejects what a real engine rejects: registrations before the style has
/// loaded, duplicate ids, layers on unknown sources and positions relative
/// to unknown layers.
#[derive(Default)]
pub struct MemoryStyle {
    sources: HashMap<String, ClusterSourceConfig>,
    /// Source ids in registration order
    source_order: Vec<String>,
    /// Layers bottom to top
    layers: Vec<StyleLayer>,
    loaded: bool,
    pending: Vec<StyleLoadedCallback>,
}

impl MemoryStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A style that has already loaded
    pub fn loaded() -> Self {
        Self {
            loaded: true,
            ..Self::default()
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Marks the style loaded and runs every waiting callback once
    pub fn finish_loading(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        let pending = std::mem::take(&mut self.pending);
        log::debug!("style loaded, running {} callbacks", pending.len());
        for callback in pending {
            callback(self);
        }
    }

    pub fn source(&self, id: &str) -> Option<&ClusterSourceConfig> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&StyleLayer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    /// Layer ids, bottom to top
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(StyleLayer::id).collect()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer_index(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    fn ensure_loaded(&self, what: &str) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(MapError::Registration(format!(
                "cannot add {} before the style has loaded",
                what
            )))
        }
    }

    /// Style-spec JSON document of everything registered
    pub fn to_style_json(&self) -> Value {
        let mut sources = Map::new();
        for id in &self.source_order {
            if let Some(source) = self.sources.get(id) {
                sources.insert(id.clone(), source.to_style_json());
            }
        }
        json!({
            "version": 8,
            "sources": sources,
            "layers": self.layers.iter().map(StyleLayer::to_style_json).collect::<Vec<_>>(),
        })
    }
}

impl StyleRegistry for MemoryStyle {
    fn add_source(&mut self, id: &str, source: &ClusterSourceConfig) -> Result<()> {
        self.ensure_loaded(&format!("source '{}'", id))?;
        if self.sources.contains_key(id) {
            return Err(MapError::Registration(format!(
                "source '{}' already exists",
                id
            )));
        }
        self.sources.insert(id.to_string(), source.clone());
        self.source_order.push(id.to_string());
        Ok(())
    }

    fn add_layer(&mut self, layer: &StyleLayer, position: LayerPosition) -> Result<()> {
        self.ensure_loaded(&format!("layer '{}'", layer.id()))?;
        if self.layer_index(layer.id()).is_some() {
            return Err(MapError::Registration(format!(
                "layer '{}' already exists",
                layer.id()
            )));
        }
        if !self.sources.contains_key(layer.source()) {
            return Err(MapError::Registration(format!(
                "layer '{}' references unknown source '{}'",
                layer.id(),
                layer.source()
            )));
        }

        let relative = |id: &str| {
            self.layer_index(id).ok_or_else(|| {
                MapError::Registration(format!(
                    "cannot position layer '{}' relative to unknown layer '{}'",
                    layer.id(),
                    id
                ))
            })
        };
        let index = match &position {
            LayerPosition::Default => self.layers.len(),
            LayerPosition::Above(id) => relative(id)? + 1,
            LayerPosition::Below(id) => relative(id)?,
            LayerPosition::At(index) => (*index).min(self.layers.len()),
        };

        self.layers.insert(index, layer.clone());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<()> {
        let index = self
            .layer_index(id)
            .ok_or_else(|| MapError::Registration(format!("layer '{}' does not exist", id)))?;
        self.layers.remove(index);
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<()> {
        if let Some(layer) = self.layers.iter().find(|layer| layer.source() == id) {
            return Err(MapError::Registration(format!(
                "source '{}' is still used by layer '{}'",
                id,
                layer.id()
            )));
        }
        self.sources
            .remove(id)
            .ok_or_else(|| MapError::Registration(format!("source '{}' does not exist", id)))?;
        self.source_order.retain(|source| source != id);
        Ok(())
    }

    fn on_style_loaded(&mut self, callback: StyleLoadedCallback) {
        if self.loaded {
            callback(self);
        } else {
            self.pending.push(callback);
        }
    }
}

impl std::fmt::Debug for MemoryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStyle")
            .field("sources", &self.source_order)
            .field("layers", &self.layer_ids())
            .field("loaded", &self.loaded)
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::FeatureCollection;
    use crate::style::layer::{CircleLayer, SymbolLayer};
    use crate::style::source::configure_default_source;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn circle(id: &str) -> StyleLayer {
        CircleLayer::new(id, "src").into()
    }

    fn with_source() -> MemoryStyle {
        let mut style = MemoryStyle::loaded();
        style
            .add_source("src", &configure_default_source(FeatureCollection::empty()))
            .unwrap();
        style
    }

    #[test]
    fn test_rejects_before_load() {
        let mut style = MemoryStyle::new();
        let source = configure_default_source(FeatureCollection::empty());
        assert!(matches!(
            style.add_source("src", &source),
            Err(MapError::Registration(_))
        ));
        style.finish_loading();
        assert!(style.add_source("src", &source).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let mut style = with_source();
        let source = configure_default_source(FeatureCollection::empty());
        assert!(style.add_source("src", &source).is_err());
        style.add_layer(&circle("a"), LayerPosition::Default).unwrap();
        assert!(style.add_layer(&circle("a"), LayerPosition::Default).is_err());
        assert_eq!(style.layer_count(), 1);
    }

    #[test]
    fn test_unknown_source() {
        let mut style = MemoryStyle::loaded();
        let layer: StyleLayer = SymbolLayer::new("labels", "nowhere").into();
        assert!(style.add_layer(&layer, LayerPosition::Default).is_err());
    }

    #[test]
    fn test_positions() {
        let mut style = with_source();
        style.add_layer(&circle("middle"), LayerPosition::Default).unwrap();
        style
            .add_layer(&circle("bottom"), LayerPosition::Below("middle".to_string()))
            .unwrap();
        style
            .add_layer(&circle("top"), LayerPosition::Above("middle".to_string()))
            .unwrap();
        style.add_layer(&circle("first"), LayerPosition::At(0)).unwrap();
        assert_eq!(style.layer_ids(), vec!["first", "bottom", "middle", "top"]);

        let err = style
            .add_layer(&circle("lost"), LayerPosition::Below("missing".to_string()))
            .unwrap_err();
        assert!(matches!(err, MapError::Registration(_)));
    }

    #[test]
    fn test_remove() {
        let mut style = with_source();
        style.add_layer(&circle("a"), LayerPosition::Default).unwrap();
        assert!(style.remove_source("src").is_err());
        style.remove_layer("a").unwrap();
        style.remove_source("src").unwrap();
        assert_eq!(style.source_count(), 0);
        assert!(style.remove_layer("a").is_err());
    }

    #[test]
    fn test_callbacks_run_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut style = MemoryStyle::new();
        let counter = calls.clone();
        style.on_style_loaded(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        style.finish_loading();
        style.finish_loading();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Late subscribers run immediately
        let counter = calls.clone();
        style.on_style_loaded(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_style_json() {
        let mut style = with_source();
        style.add_layer(&circle("a"), LayerPosition::Default).unwrap();
        let json = style.to_style_json();
        assert_eq!(json["version"], 8);
        assert_eq!(json["sources"]["src"]["type"], "geojson");
        assert_eq!(json["layers"][0]["id"], "a");
    }
}

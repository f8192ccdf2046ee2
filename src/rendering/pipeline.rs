//! Render pipeline orchestrator
//!
//! Builds the feature collection, wraps it in a clustering source, composes
//! the three cluster layers and registers everything with a host style.
//! Registration is best-effort: a rejected source or layer is logged and
//! recorded in the [`RenderReport`], and the remaining items are still
//! attempted.

use crate::core::config::PipelineConfig;
use crate::core::geo::LatLng;
use crate::data::builder::FeatureCollectionBuilder;
use crate::data::geojson::{FeatureCollection, Properties};
use crate::style::composer::{ClusterLayers, LayerComposer};
use crate::style::layer::LayerPosition;
use crate::style::source::{configure_source_with, ClusterSourceConfig};
use crate::traits::StyleRegistry;
use crate::Result;

/// What a registration step touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisteredItem {
    Source,
    Layer,
}

impl std::fmt::Display for RegisteredItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisteredItem::Source => write!(f, "source"),
            RegisteredItem::Layer => write!(f, "layer"),
        }
    }
}

/// Outcome of one add/remove call against the host style
#[derive(Debug)]
pub struct RegistrationOutcome {
    pub item: RegisteredItem,
    pub id: String,
    pub result: Result<()>,
}

impl RegistrationOutcome {
    fn record(item: RegisteredItem, id: &str, result: Result<()>) -> Self {
        if let Err(e) = &result {
            log::warn!("Failed to register {} '{}': {}", item, id, e);
        }
        Self {
            item,
            id: id.to_string(),
            result,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Where an overlay should anchor the view for one input point
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationAnchor {
    pub feature_id: String,
    pub coordinate: LatLng,
}

/// Result of a render request
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Registration attempts, in the order they were made
    pub outcomes: Vec<RegistrationOutcome>,
    /// One anchor per input point, in input order
    pub annotations: Vec<AnnotationAnchor>,
}

impl RenderReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(RegistrationOutcome::is_ok)
    }

    pub fn failures(&self) -> Vec<&RegistrationOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok()).collect()
    }

    pub fn registered(&self, item: RegisteredItem) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.item == item && o.is_ok())
            .count()
    }
}

/// Pure output of the pipeline, before anything touches the host style
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedClusters {
    pub source_id: String,
    pub source: ClusterSourceConfig,
    pub layers: ClusterLayers,
}

impl PreparedClusters {
    pub fn features(&self) -> &FeatureCollection {
        &self.source.data
    }

    pub fn annotations(&self) -> Vec<AnnotationAnchor> {
        self.source
            .data
            .iter()
            .map(|feature| AnnotationAnchor {
                feature_id: feature.id.clone(),
                coordinate: feature.geometry,
            })
            .collect()
    }
}

/// Turns point sets into a clustered source plus its layers on a host style
#[derive(Debug)]
pub struct ClusterPipeline {
    config: PipelineConfig,
    builder: FeatureCollectionBuilder,
    composer: LayerComposer,
}

impl ClusterPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let builder = FeatureCollectionBuilder::new(&config.ids.feature_prefix);
        let composer = LayerComposer::new(config.ids.clone(), config.style.clone())?;
        Ok(Self {
            config,
            builder,
            composer,
        })
    }

    /// Attaches properties to every built feature
    pub fn with_properties<F>(mut self, properties: F) -> Self
    where
        F: Fn(usize, &LatLng) -> Option<Properties> + Send + Sync + 'static,
    {
        self.builder = self.builder.with_properties(properties);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn composer(&self) -> &LayerComposer {
        &self.composer
    }

    /// Builds, configures and composes without registering anything
    pub fn prepare(&self, points: &[LatLng]) -> Result<PreparedClusters> {
        let invalid = points.iter().filter(|p| !p.is_valid()).count();
        if invalid > 0 {
            log::warn!("{} of {} points are outside lat/lng range", invalid, points.len());
        }

        let features = self.builder.build(points);
        let source = configure_source_with(features, self.config.cluster)?;
        let source_id = self.config.ids.source.clone();
        let layers = self.composer.compose(&source_id)?;
        log::debug!(
            "prepared source '{}' with {} features",
            source_id,
            source.data.len()
        );

        Ok(PreparedClusters {
            source_id,
            source,
            layers,
        })
    }

    /// Registers a prepared source and its layers, best-effort
    pub fn register(
        &self,
        registry: &mut dyn StyleRegistry,
        prepared: &PreparedClusters,
    ) -> Vec<RegistrationOutcome> {
        let mut outcomes = Vec::with_capacity(4);
        outcomes.push(RegistrationOutcome::record(
            RegisteredItem::Source,
            &prepared.source_id,
            registry.add_source(&prepared.source_id, &prepared.source),
        ));
        for (layer, position) in prepared.layers.registration_order() {
            outcomes.push(RegistrationOutcome::record(
                RegisteredItem::Layer,
                layer.id(),
                registry.add_layer(layer, position),
            ));
        }
        outcomes
    }

    /// Runs the whole pipeline against a loaded style.
    ///
    /// `on_complete` runs exactly once, after every registration has been
    /// attempted. An error is only returned when the layers cannot be
    /// composed, in which case nothing was registered and `on_complete` is
    /// not called.
    pub fn render<F>(
        &self,
        registry: &mut dyn StyleRegistry,
        points: &[LatLng],
        on_complete: F,
    ) -> Result<RenderReport>
    where
        F: FnOnce(&RenderReport),
    {
        let prepared = self.prepare(points)?;
        let report = RenderReport {
            outcomes: self.register(registry, &prepared),
            annotations: prepared.annotations(),
        };

        if report.is_success() {
            log::debug!(
                "registered '{}' with {} layers",
                prepared.source_id,
                report.registered(RegisteredItem::Layer)
            );
        }
        on_complete(&report);
        Ok(report)
    }

    /// Defers [`render`](Self::render) until the host style has loaded
    pub fn attach<F>(self, registry: &mut dyn StyleRegistry, points: Vec<LatLng>, on_complete: F)
    where
        F: FnOnce(&RenderReport) + Send + 'static,
    {
        registry.on_style_loaded(Box::new(move |registry: &mut dyn StyleRegistry| {
            if let Err(e) = self.render(registry, &points, on_complete) {
                log::error!("cluster pipeline failed: {}", e);
            }
        }));
    }

    /// Removes the layers and the source this pipeline registers, top
    /// layer first, so the same ids can be rendered again
    pub fn teardown(&self, registry: &mut dyn StyleRegistry) -> Vec<RegistrationOutcome> {
        let ids = &self.config.ids;
        let mut outcomes: Vec<_> = ids
            .layer_ids()
            .iter()
            .rev()
            .map(|id| {
                RegistrationOutcome::record(RegisteredItem::Layer, id, registry.remove_layer(id))
            })
            .collect();
        outcomes.push(RegistrationOutcome::record(
            RegisteredItem::Source,
            &ids.source,
            registry.remove_source(&ids.source),
        ));
        outcomes
    }
}

impl Default for ClusterPipeline {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            builder: FeatureCollectionBuilder::default(),
            composer: LayerComposer::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::registry::MemoryStyle;
    use crate::style::layer::{StyleLayer, SymbolLayer};
    use crate::traits::StyleLoadedCallback;
    use crate::style::source::configure_default_source;
    use crate::MapError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn points() -> Vec<LatLng> {
        vec![
            LatLng::new(63.1224, -150.4048),
            LatLng::new(63.1016, -151.5129),
            LatLng::new(63.0781, -151.3597),
        ]
    }

    #[test]
    fn test_render_registers_in_z_order() {
        let mut style = MemoryStyle::loaded();
        let mut completions = 0;
        let report = ClusterPipeline::default()
            .render(&mut style, &points(), |_| completions += 1)
            .unwrap();

        assert_eq!(completions, 1);
        assert!(report.is_success());
        assert_eq!(report.registered(RegisteredItem::Source), 1);
        assert_eq!(report.registered(RegisteredItem::Layer), 3);
        assert_eq!(
            style.layer_ids(),
            vec![
                "unclusteredImageLayerIdentifier",
                "clusteredLayerIdentifier",
                "clusteredCountLayerIdentifier"
            ]
        );
        assert_eq!(style.source("pilot-source").unwrap().data.len(), 3);
    }

    #[test]
    fn test_annotations_follow_input() {
        let mut style = MemoryStyle::loaded();
        let report = ClusterPipeline::default()
            .render(&mut style, &points(), |_| {})
            .unwrap();
        assert_eq!(report.annotations.len(), 3);
        assert_eq!(report.annotations[2].feature_id, "view_annotation_2");
        assert_eq!(report.annotations[2].coordinate, points()[2]);
    }

    #[test]
    fn test_failures_do_not_stop_remaining_registrations() {
        let mut style = MemoryStyle::loaded();
        let pipeline = ClusterPipeline::default();
        pipeline.render(&mut style, &points(), |_| {}).unwrap();

        // Second run collides on the source and every layer id
        let mut completions = 0;
        let report = pipeline
            .render(&mut style, &points(), |_| completions += 1)
            .unwrap();
        assert_eq!(completions, 1);
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.failures().len(), 4);
        assert!(report
            .failures()
            .iter()
            .all(|o| matches!(o.result, Err(MapError::Registration(_)))));
    }

    #[test]
    fn test_partial_failure() {
        let mut style = MemoryStyle::loaded();
        // A foreign layer squatting on the count layer id
        let squatter_source = configure_default_source(FeatureCollection::empty());
        style.add_source("other", &squatter_source).unwrap();
        let squatter: StyleLayer = SymbolLayer::new("clusteredCountLayerIdentifier", "other").into();
        style.add_layer(&squatter, LayerPosition::Default).unwrap();

        let report = ClusterPipeline::default()
            .render(&mut style, &points(), |_| {})
            .unwrap();
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].id, "clusteredCountLayerIdentifier");
        assert_eq!(report.registered(RegisteredItem::Layer), 2);
    }

    /// Host style that refuses one layer id outright
    struct RefusingStyle {
        inner: MemoryStyle,
        refused: &'static str,
    }

    impl StyleRegistry for RefusingStyle {
        fn add_source(&mut self, id: &str, source: &ClusterSourceConfig) -> Result<()> {
            self.inner.add_source(id, source)
        }

        fn add_layer(&mut self, layer: &StyleLayer, position: LayerPosition) -> Result<()> {
            if layer.id() == self.refused {
                return Err(MapError::Registration(format!("{} refused", layer.id())));
            }
            self.inner.add_layer(layer, position)
        }

        fn remove_layer(&mut self, id: &str) -> Result<()> {
            self.inner.remove_layer(id)
        }

        fn remove_source(&mut self, id: &str) -> Result<()> {
            self.inner.remove_source(id)
        }

        fn on_style_loaded(&mut self, callback: StyleLoadedCallback) {
            self.inner.on_style_loaded(callback)
        }
    }

    #[test]
    fn test_counts_land_without_circles() {
        let mut style = RefusingStyle {
            inner: MemoryStyle::loaded(),
            refused: "clusteredLayerIdentifier",
        };
        let report = ClusterPipeline::default()
            .render(&mut style, &points(), |_| {})
            .unwrap();

        assert_eq!(report.registered(RegisteredItem::Source), 1);
        assert!(report
            .failures()
            .iter()
            .all(|o| o.id != "clusteredCountLayerIdentifier"));
        assert!(style.inner.layer("clusteredCountLayerIdentifier").is_some());
        assert!(style.inner.layer("clusteredLayerIdentifier").is_none());
    }

    #[test]
    fn test_attach_waits_for_style() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut style = MemoryStyle::new();
        let counter = calls.clone();
        ClusterPipeline::default().attach(&mut style, points(), move |report| {
            assert!(report.is_success());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(style.layer_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        style.finish_loading();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(style.layer_count(), 3);
    }

    #[test]
    fn test_teardown_allows_rerender() {
        let mut style = MemoryStyle::loaded();
        let pipeline = ClusterPipeline::default();
        pipeline.render(&mut style, &points(), |_| {}).unwrap();

        let removed = pipeline.teardown(&mut style);
        assert!(removed.iter().all(RegistrationOutcome::is_ok));
        assert_eq!(style.layer_count(), 0);
        assert_eq!(style.source_count(), 0);

        let report = pipeline.render(&mut style, &points(), |_| {}).unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.cluster.radius = -1;
        assert!(matches!(
            ClusterPipeline::new(config),
            Err(MapError::Config(_))
        ));
    }
}

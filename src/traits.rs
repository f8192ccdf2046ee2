//! Host engine abstraction
//!
//! The clustering core never talks to a rendering engine directly. It only
//! needs a style it can add sources and layers to, plus the one-shot
//! "style loaded" event that gates the first registration.

use futures::channel::oneshot;
use futures::Future;

use crate::style::layer::{LayerPosition, StyleLayer};
use crate::style::source::ClusterSourceConfig;
use crate::{MapError, Result};

/// Callback run when the host style has finished loading
pub type StyleLoadedCallback = Box<dyn FnOnce(&mut dyn StyleRegistry) + Send>;

/// Mutable style of a host map engine
pub trait StyleRegistry {
    /// Registers a source under `id`
    fn add_source(&mut self, id: &str, source: &ClusterSourceConfig) -> Result<()>;

    /// Registers a layer (its id travels with the layer) at `position`
    fn add_layer(&mut self, layer: &StyleLayer, position: LayerPosition) -> Result<()>;

    fn remove_layer(&mut self, id: &str) -> Result<()>;

    fn remove_source(&mut self, id: &str) -> Result<()>;

    /// Runs `callback` once the style is loaded. Each callback runs at most
    /// once; if the style never loads it never runs.
    fn on_style_loaded(&mut self, callback: StyleLoadedCallback);
}

/// Resolves once `registry` reports its style loaded.
///
/// Fails with [`MapError::StyleUnavailable`] if the registry drops the
/// callback without ever loading.
pub fn style_loaded(registry: &mut dyn StyleRegistry) -> impl Future<Output = Result<()>> {
    let (tx, rx) = oneshot::channel();
    registry.on_style_loaded(Box::new(move |_: &mut dyn StyleRegistry| {
        let _ = tx.send(());
    }));
    async move { rx.await.map_err(|_| MapError::StyleUnavailable) }
}

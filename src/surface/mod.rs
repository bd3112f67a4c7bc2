//! Host surface abstraction
//!
//! A surface is the interactive map widget the controller draws into. The
//! controller owns it exclusively and only talks to it through this trait, so
//! the same orchestration drives the in-memory [`headless::HeadlessSurface`]
//! and the `egui` host.

pub mod headless;

use crate::{
    core::{
        geo::{LatLngBounds, Point},
        view_state::MapViewState,
    },
    layers::base::{LayerId, LayerType, MapLayer},
    Result,
};

/// Primitive operations a map widget exposes to the controller
pub trait MapSurface {
    /// Creates the underlying widget.
    ///
    /// Fails with `MapError::WidgetUnavailable` while the host container has
    /// no usable area; the controller retries with backoff.
    fn attach(&mut self) -> Result<()>;

    /// Releases the widget and every layer on it
    fn detach(&mut self);

    fn is_attached(&self) -> bool;

    /// Adds a layer; the surface may reject it
    fn add_layer(&mut self, layer: MapLayer) -> Result<LayerId>;

    fn remove_layer(&mut self, id: LayerId) -> Result<Option<MapLayer>>;

    /// Registered layers in render order
    fn layer_ids(&self) -> Vec<LayerId>;

    fn layer(&self, id: LayerId) -> Option<&MapLayer>;

    /// Current center and zoom
    fn view(&self) -> MapViewState;

    /// Jumps to `state` without animation
    fn set_view(&mut self, state: MapViewState);

    /// Frames `bounds` with `padding` pixels on every side and returns the resulting view
    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) -> Result<MapViewState>;

    /// Moves map content by `delta` pixels
    fn pan_by(&mut self, delta: Point);

    /// Changes zoom by `delta` levels around an optional container-pixel focus
    fn zoom_by(&mut self, delta: f64, focus: Option<Point>);

    fn resize(&mut self, size: Point);

    fn size(&self) -> Point;

    /// Number of registered layers of one kind
    fn count_layers(&self, layer_type: LayerType) -> usize {
        self.layer_ids()
            .into_iter()
            .filter_map(|id| self.layer(id))
            .filter(|layer| layer.layer_type() == layer_type)
            .count()
    }
}

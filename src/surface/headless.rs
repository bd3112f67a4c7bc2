use crate::{
    core::{
        geo::{LatLngBounds, Point},
        view_state::MapViewState,
        viewport::Viewport,
    },
    layers::{
        base::{LayerId, MapLayer},
        manager::LayerManager,
    },
    surface::MapSurface,
    MapError, Result,
};

/// In-memory surface backed by a Web Mercator [`Viewport`].
///
/// Used by tests and by hosts that paint the layers themselves.
#[derive(Debug)]
pub struct HeadlessSurface {
    viewport: Viewport,
    attached: bool,
    layers: LayerManager,
}

impl HeadlessSurface {
    pub fn new(size: Point) -> Self {
        let mut viewport = Viewport::default();
        viewport.set_size(size);
        Self {
            viewport,
            attached: false,
            layers: LayerManager::new(),
        }
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            attached: false,
            layers: LayerManager::new(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Mutable access for hosts that keep per-view caches on the layers
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut MapLayer> {
        self.layers.get_layer_mut(id)
    }

    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.viewport.set_zoom_limits(min_zoom, max_zoom);
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.attached {
            Ok(())
        } else {
            Err(MapError::NotInitialized)
        }
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::with_viewport(Viewport::default())
    }
}

impl MapSurface for HeadlessSurface {
    fn attach(&mut self) -> Result<()> {
        if !self.viewport.has_area() {
            return Err(MapError::WidgetUnavailable {
                attempts: 1,
                reason: format!(
                    "container is {}x{} pixels",
                    self.viewport.size.x, self.viewport.size.y
                ),
            });
        }
        self.attached = true;
        Ok(())
    }

    fn detach(&mut self) {
        let dropped = self.layers.clear();
        if !dropped.is_empty() {
            log::debug!("detached surface with {} layer(s)", dropped.len());
        }
        self.attached = false;
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn add_layer(&mut self, layer: MapLayer) -> Result<LayerId> {
        self.ensure_attached()?;
        layer.validate_geometry()?;
        Ok(self.layers.add_layer(layer))
    }

    fn remove_layer(&mut self, id: LayerId) -> Result<Option<MapLayer>> {
        self.ensure_attached()?;
        Ok(self.layers.remove_layer(id))
    }

    fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.list_layers()
    }

    fn layer(&self, id: LayerId) -> Option<&MapLayer> {
        self.layers.get_layer(id)
    }

    fn view(&self) -> MapViewState {
        MapViewState::new(self.viewport.center, self.viewport.zoom)
    }

    fn set_view(&mut self, state: MapViewState) {
        self.viewport.set_center(state.center);
        self.viewport.set_zoom(state.zoom);
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) -> Result<MapViewState> {
        self.viewport.fit_bounds(bounds, padding)?;
        Ok(self.view())
    }

    fn pan_by(&mut self, delta: Point) {
        self.viewport.pan(delta);
    }

    fn zoom_by(&mut self, delta: f64, focus: Option<Point>) {
        let target = self.viewport.zoom + delta;
        self.viewport.zoom_around(target, focus);
    }

    fn resize(&mut self, size: Point) {
        self.viewport.set_size(size);
    }

    fn size(&self) -> Point {
        self.viewport.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::data::{intensity::IntensityModel, point::AccidentPoint};
    use crate::layers::{
        base::{LayerType, RenderGeneration},
        heatmap::{HeatLayer, HeatmapConfig},
    };

    fn heat_layer() -> MapLayer {
        let points = vec![AccidentPoint::new(1, -23.5, -46.6)];
        let refs: Vec<_> = points.iter().collect();
        MapLayer::Heatmap(
            HeatLayer::build(
                &refs,
                &IntensityModel::default(),
                &HeatmapConfig::default(),
                RenderGeneration(1),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_zero_sized_container_is_unavailable() {
        let mut surface = HeadlessSurface::new(Point::new(0.0, 400.0));
        assert!(matches!(
            surface.attach(),
            Err(MapError::WidgetUnavailable { .. })
        ));
        assert!(!surface.is_attached());

        surface.resize(Point::new(640.0, 400.0));
        assert!(surface.attach().is_ok());
    }

    #[test]
    fn test_layers_require_attach() {
        let mut surface = HeadlessSurface::default();
        assert!(matches!(
            surface.add_layer(heat_layer()),
            Err(MapError::NotInitialized)
        ));

        surface.attach().unwrap();
        let id = surface.add_layer(heat_layer()).unwrap();
        assert_eq!(surface.count_layers(LayerType::Heatmap), 1);

        surface.detach();
        assert!(surface.layer(id).is_none());
        assert!(!surface.is_attached());
    }

    #[test]
    fn test_set_view_round_trip() {
        let mut surface = HeadlessSurface::default();
        let state = MapViewState::new(LatLng::new(-23.5, -46.6), 11.0);
        surface.set_view(state);
        assert_eq!(surface.view(), state);
    }
}

use crate::core::config::MapViewConfig;
use crate::data::{intensity::IntensityModel, point::AccidentPoint};
use crate::layers::{
    base::{LayerId, MapLayer, RenderGeneration, RenderMode},
    cluster::ClusterLayer,
    heatmap::{HeatLayer, HeatmapConfig},
};
use crate::spatial::clustering::ClusteringConfig;
use crate::surface::MapSurface;
use crate::ui::style::ClusterPalette;
use crate::{MapError, Result};

/// What the renderer currently has on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererState {
    #[default]
    Empty,
    Heatmap {
        layer_id: LayerId,
        generation: RenderGeneration,
    },
    Clusters {
        layer_id: LayerId,
        generation: RenderGeneration,
    },
}

impl RendererState {
    pub fn is_empty(&self) -> bool {
        matches!(self, RendererState::Empty)
    }

    pub fn layer_id(&self) -> Option<LayerId> {
        match self {
            RendererState::Empty => None,
            RendererState::Heatmap { layer_id, .. } | RendererState::Clusters { layer_id, .. } => {
                Some(*layer_id)
            }
        }
    }

    pub fn generation(&self) -> Option<RenderGeneration> {
        match self {
            RendererState::Empty => None,
            RendererState::Heatmap { generation, .. }
            | RendererState::Clusters { generation, .. } => Some(*generation),
        }
    }

    pub fn mode(&self) -> RenderMode {
        match self {
            RendererState::Empty => RenderMode::None,
            RendererState::Heatmap { .. } => RenderMode::Heatmap,
            RendererState::Clusters { .. } => RenderMode::Clusters,
        }
    }
}

/// Builds the layer for one render mode
pub trait LayerStrategy {
    fn mode(&self) -> RenderMode;

    fn build(&self, points: &[&AccidentPoint], generation: RenderGeneration) -> Result<MapLayer>;
}

pub struct HeatmapStrategy {
    model: IntensityModel,
    config: HeatmapConfig,
}

impl HeatmapStrategy {
    pub fn new(model: IntensityModel, config: HeatmapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }
}

impl LayerStrategy for HeatmapStrategy {
    fn mode(&self) -> RenderMode {
        RenderMode::Heatmap
    }

    fn build(&self, points: &[&AccidentPoint], generation: RenderGeneration) -> Result<MapLayer> {
        HeatLayer::build(points, &self.model, &self.config, generation).map(MapLayer::Heatmap)
    }
}

pub struct ClusterStrategy {
    config: ClusteringConfig,
    palette: ClusterPalette,
}

impl ClusterStrategy {
    pub fn new(config: ClusteringConfig, palette: ClusterPalette) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, palette })
    }
}

impl LayerStrategy for ClusterStrategy {
    fn mode(&self) -> RenderMode {
        RenderMode::Clusters
    }

    fn build(&self, points: &[&AccidentPoint], generation: RenderGeneration) -> Result<MapLayer> {
        ClusterLayer::build(points, &self.config, generation)
            .map(|layer| MapLayer::Clusters(layer.with_palette(self.palette.clone())))
    }
}

/// Keeps exactly one data layer on the surface.
///
/// Switching mode always removes the current layer before the next one is
/// built, so a surface never holds a heat layer and a cluster layer at once.
/// Any failure leaves the renderer `Empty`.
pub struct LayerRenderer {
    heatmap: HeatmapStrategy,
    clusters: ClusterStrategy,
    state: RendererState,
}

impl LayerRenderer {
    pub fn new(config: &MapViewConfig) -> Result<Self> {
        Ok(Self {
            heatmap: HeatmapStrategy::new(
                IntensityModel::new(config.intensity.clone())?,
                config.heatmap.clone(),
            )?,
            clusters: ClusterStrategy::new(config.clustering.clone(), ClusterPalette::default())?,
            state: RendererState::Empty,
        })
    }

    pub fn with_palette(mut self, palette: ClusterPalette) -> Self {
        self.clusters.palette = palette;
        self
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn mode(&self) -> RenderMode {
        self.state.mode()
    }

    pub fn active_layer(&self) -> Option<LayerId> {
        self.state.layer_id()
    }

    fn strategy(&self, mode: RenderMode) -> Option<&dyn LayerStrategy> {
        match mode {
            RenderMode::Heatmap => Some(&self.heatmap),
            RenderMode::Clusters => Some(&self.clusters),
            RenderMode::None => None,
        }
    }

    /// Removes the active layer, if any, and returns to `Empty`
    pub fn teardown<S: MapSurface + ?Sized>(&mut self, surface: &mut S) {
        if let Some(layer_id) = self.state.layer_id() {
            match surface.remove_layer(layer_id) {
                Ok(Some(_)) => log::debug!("removed {} layer {layer_id}", self.state.mode()),
                Ok(None) => log::warn!("layer {layer_id} was already gone from the surface"),
                Err(e) => log::warn!("failed to remove layer {layer_id}: {e}"),
            }
        }
        self.state = RendererState::Empty;
    }

    /// Replaces the current layer with one drawn in `mode` from `points`.
    ///
    /// An empty point set or `RenderMode::None` leaves the renderer `Empty`.
    pub fn set_mode<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        mode: RenderMode,
        points: &[&AccidentPoint],
        generation: RenderGeneration,
    ) -> Result<RendererState> {
        self.teardown(surface);

        let strategy = match self.strategy(mode) {
            Some(strategy) if !points.is_empty() => strategy,
            _ => return Ok(self.state),
        };

        let point_count = points.len();
        let layer = strategy
            .build(points, generation)
            .and_then(|layer| surface.add_layer(layer));

        match layer {
            Ok(layer_id) => {
                self.state = match mode {
                    RenderMode::Heatmap => RendererState::Heatmap {
                        layer_id,
                        generation,
                    },
                    _ => RendererState::Clusters {
                        layer_id,
                        generation,
                    },
                };
                log::debug!(
                    "built {mode} layer {layer_id} from {point_count} point(s) for {generation}"
                );
                Ok(self.state)
            }
            Err(e) => {
                log::error!("{mode} layer with {point_count} point(s) failed: {e}");
                Err(match e {
                    MapError::InvalidGeometry(_) | MapError::LayerConstruction { .. } => e,
                    other => MapError::LayerConstruction {
                        mode,
                        point_count,
                        reason: other.to_string(),
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;
    use crate::layers::base::LayerType;
    use crate::surface::headless::HeadlessSurface;

    fn setup() -> (LayerRenderer, HeadlessSurface) {
        let mut surface = HeadlessSurface::new(Point::new(800.0, 600.0));
        surface.attach().unwrap();
        (LayerRenderer::new(&MapViewConfig::default()).unwrap(), surface)
    }

    fn points() -> Vec<AccidentPoint> {
        vec![
            AccidentPoint::new(1, -23.55, -46.63).with_casualties(1, 0),
            AccidentPoint::new(2, -22.90, -43.17),
        ]
    }

    #[test]
    fn test_mode_switches_keep_one_layer() {
        let (mut renderer, mut surface) = setup();
        let data = points();
        let refs: Vec<_> = data.iter().collect();

        let modes = [
            RenderMode::Heatmap,
            RenderMode::Clusters,
            RenderMode::Clusters,
            RenderMode::None,
            RenderMode::Heatmap,
            RenderMode::Heatmap,
        ];
        for (i, mode) in modes.into_iter().enumerate() {
            let state = renderer
                .set_mode(&mut surface, mode, &refs, RenderGeneration(i as u64 + 1))
                .unwrap();
            assert_eq!(state.mode(), mode);

            let heat = surface.count_layers(LayerType::Heatmap);
            let clusters = surface.count_layers(LayerType::Clusters);
            assert!(heat + clusters <= 1);
            assert_eq!(surface.layer_ids().len(), heat + clusters);
        }
        assert_eq!(renderer.state().generation(), Some(RenderGeneration(6)));
    }

    #[test]
    fn test_empty_points_render_nothing() {
        let (mut renderer, mut surface) = setup();
        let state = renderer
            .set_mode(&mut surface, RenderMode::Clusters, &[], RenderGeneration(1))
            .unwrap();
        assert!(state.is_empty());
        assert!(surface.layer_ids().is_empty());
    }

    #[test]
    fn test_failure_leaves_empty() {
        let (mut renderer, mut surface) = setup();
        let data = points();
        let refs: Vec<_> = data.iter().collect();
        renderer
            .set_mode(&mut surface, RenderMode::Heatmap, &refs, RenderGeneration(1))
            .unwrap();

        let broken = vec![AccidentPoint::new(9, f64::NAN, -40.0)];
        let broken_refs: Vec<_> = broken.iter().collect();
        let err = renderer
            .set_mode(&mut surface, RenderMode::Clusters, &broken_refs, RenderGeneration(2))
            .unwrap_err();

        assert!(matches!(err, MapError::InvalidGeometry(_)));
        assert!(renderer.state().is_empty());
        assert!(surface.layer_ids().is_empty());
    }

    #[test]
    fn test_detached_surface_is_a_construction_error() {
        let (mut renderer, mut surface) = setup();
        surface.detach();
        let data = points();
        let refs: Vec<_> = data.iter().collect();

        let err = renderer
            .set_mode(&mut surface, RenderMode::Heatmap, &refs, RenderGeneration(1))
            .unwrap_err();
        assert!(matches!(
            err,
            MapError::LayerConstruction {
                mode: RenderMode::Heatmap,
                point_count: 2,
                ..
            }
        ));
        assert!(renderer.state().is_empty());
    }
}

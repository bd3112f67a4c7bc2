use crate::core::geo::LatLngBounds;
use crate::layers::{cluster::ClusterLayer, heatmap::HeatLayer};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle the surface hands out for an added layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// Tags each completed render pass; strictly increasing per controller
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RenderGeneration(pub u64);

impl RenderGeneration {
    pub const INITIAL: RenderGeneration = RenderGeneration(0);

    pub fn next(self) -> Self {
        RenderGeneration(self.0.saturating_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RenderGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the accident batch is drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Heatmap,
    Clusters,
    /// Nothing is drawn; `pontos` is the dashboard's name for this mode
    #[serde(alias = "pontos")]
    None,
}

impl RenderMode {
    /// The layer kind this mode produces, if any
    pub fn layer_type(&self) -> Option<LayerType> {
        match self {
            RenderMode::Heatmap => Some(LayerType::Heatmap),
            RenderMode::Clusters => Some(LayerType::Clusters),
            RenderMode::None => None,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Heatmap => write!(f, "heatmap"),
            RenderMode::Clusters => write!(f, "clusters"),
            RenderMode::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Heatmap,
    Clusters,
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerType::Heatmap => write!(f, "heatmap"),
            LayerType::Clusters => write!(f, "clusters"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerProperties {
    pub name: String,
    pub layer_type: LayerType,
    /// Render pass the layer was built for
    pub generation: RenderGeneration,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
}

impl LayerProperties {
    pub fn new(layer_type: LayerType, generation: RenderGeneration) -> Self {
        Self {
            name: format!("{layer_type} {generation}"),
            layer_type,
            generation,
            z_index: 0,
            opacity: 1.0,
            visible: true,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

/// A fully built data layer, ready to be handed to a surface
#[derive(Debug, Clone)]
pub enum MapLayer {
    Heatmap(HeatLayer),
    Clusters(ClusterLayer),
}

impl MapLayer {
    pub fn properties(&self) -> &LayerProperties {
        match self {
            MapLayer::Heatmap(layer) => layer.properties(),
            MapLayer::Clusters(layer) => layer.properties(),
        }
    }

    pub fn layer_type(&self) -> LayerType {
        self.properties().layer_type
    }

    pub fn generation(&self) -> RenderGeneration {
        self.properties().generation
    }

    pub fn point_count(&self) -> usize {
        match self {
            MapLayer::Heatmap(layer) => layer.len(),
            MapLayer::Clusters(layer) => layer.len(),
        }
    }

    /// Extent of the layer's data
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            MapLayer::Heatmap(layer) => layer.bounds(),
            MapLayer::Clusters(layer) => layer.bounds(),
        }
    }

    /// Every coordinate is finite and inside the geographic range
    pub fn validate_geometry(&self) -> Result<()> {
        let invalid = match self {
            MapLayer::Heatmap(layer) => layer
                .points()
                .iter()
                .find(|p| !p.position.is_valid() || !p.weight.is_finite())
                .map(|p| format!("heat point {:?} weight {}", p.position, p.weight)),
            MapLayer::Clusters(layer) => layer
                .markers()
                .iter()
                .find(|m| !m.position.is_valid())
                .map(|m| format!("marker {} at {:?}", m.point_id, m.position)),
        };

        match invalid {
            Some(what) => Err(MapError::InvalidGeometry(format!(
                "{} layer holds an unplaceable {what}",
                self.layer_type()
            ))),
            None => Ok(()),
        }
    }

    pub fn as_heatmap(&self) -> Option<&HeatLayer> {
        match self {
            MapLayer::Heatmap(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_clusters(&self) -> Option<&ClusterLayer> {
        match self {
            MapLayer::Clusters(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_clusters_mut(&mut self) -> Option<&mut ClusterLayer> {
        match self {
            MapLayer::Clusters(layer) => Some(layer),
            _ => None,
        }
    }

    pub fn as_heatmap_mut(&mut self) -> Option<&mut HeatLayer> {
        match self {
            MapLayer::Heatmap(layer) => Some(layer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_mode_parsing() {
        let parse = |s: &str| serde_json::from_str::<RenderMode>(&format!("\"{s}\"")).unwrap();
        assert_eq!(parse("heatmap"), RenderMode::Heatmap);
        assert_eq!(parse("clusters"), RenderMode::Clusters);
        assert_eq!(parse("none"), RenderMode::None);
        assert_eq!(parse("pontos"), RenderMode::None);
        assert!(serde_json::from_str::<RenderMode>("\"tiles\"").is_err());
    }

    #[test]
    fn test_render_mode_layer_type() {
        assert_eq!(RenderMode::Heatmap.layer_type(), Some(LayerType::Heatmap));
        assert_eq!(RenderMode::Clusters.layer_type(), Some(LayerType::Clusters));
        assert_eq!(RenderMode::None.layer_type(), None);
        assert_eq!(RenderMode::Clusters.to_string(), "clusters");
    }

    #[test]
    fn test_generation_is_monotonic() {
        let g = RenderGeneration::INITIAL;
        assert!(g.next() > g);
        assert_eq!(g.next().next().value(), 2);
        assert_eq!(RenderGeneration(u64::MAX).next().value(), u64::MAX);
    }

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::new(LayerType::Heatmap, RenderGeneration(3)).with_opacity(1.7);
        assert_eq!(props.name, "heatmap #3");
        assert_eq!(props.opacity, 1.0);
        assert!(props.visible);
    }
}

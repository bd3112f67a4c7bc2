use crate::layers::base::{LayerId, LayerType, MapLayer};
use fxhash::FxHashMap;

/// Registry of the layers currently attached to a surface, kept in render order
#[derive(Debug)]
pub struct LayerManager {
    /// All layers indexed by ID
    layers: FxHashMap<LayerId, MapLayer>,
    /// Ordered list of layer IDs for rendering (sorted by z-index)
    render_order: Vec<LayerId>,
    next_id: u64,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: FxHashMap::default(),
            render_order: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds a layer and returns its freshly allocated handle
    pub fn add_layer(&mut self, layer: MapLayer) -> LayerId {
        let layer_id = LayerId(self.next_id);
        self.next_id += 1;
        let z_index = layer.properties().z_index;

        self.layers.insert(layer_id, layer);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.properties().z_index > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        log::debug!("registered layer {layer_id} at position {insert_pos}");
        layer_id
    }

    pub fn remove_layer(&mut self, layer_id: LayerId) -> Option<MapLayer> {
        self.render_order.retain(|id| *id != layer_id);
        self.layers.remove(&layer_id)
    }

    pub fn get_layer(&self, layer_id: LayerId) -> Option<&MapLayer> {
        self.layers.get(&layer_id)
    }

    pub fn get_layer_mut(&mut self, layer_id: LayerId) -> Option<&mut MapLayer> {
        self.layers.get_mut(&layer_id)
    }

    /// Layer IDs in render order
    pub fn list_layers(&self) -> Vec<LayerId> {
        self.render_order.clone()
    }

    /// Gets all layers in render order
    pub fn layers(&self) -> Vec<(LayerId, &MapLayer)> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id).map(|l| (*id, l)))
            .collect()
    }

    /// Number of registered layers of one kind
    pub fn count_of(&self, layer_type: LayerType) -> usize {
        self.layers
            .values()
            .filter(|l| l.layer_type() == layer_type)
            .count()
    }

    /// Removes every layer, returning them in render order
    pub fn clear(&mut self) -> Vec<MapLayer> {
        let order = std::mem::take(&mut self.render_order);
        order
            .into_iter()
            .filter_map(|id| self.layers.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{intensity::IntensityModel, point::AccidentPoint};
    use crate::layers::{
        base::RenderGeneration,
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
    fn test_add_and_remove() {
        let mut manager = LayerManager::new();
        let a = manager.add_layer(heat_layer());
        let b = manager.add_layer(heat_layer());

        assert_ne!(a, b);
        assert_eq!(manager.list_layers(), vec![a, b]);
        assert_eq!(manager.count_of(LayerType::Heatmap), 2);
        assert_eq!(manager.count_of(LayerType::Clusters), 0);

        assert!(manager.remove_layer(a).is_some());
        assert!(manager.remove_layer(a).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut manager = LayerManager::new();
        let a = manager.add_layer(heat_layer());
        manager.remove_layer(a);
        let b = manager.add_layer(heat_layer());
        assert!(b > a);
    }

    #[test]
    fn test_clear() {
        let mut manager = LayerManager::new();
        manager.add_layer(heat_layer());
        manager.add_layer(heat_layer());

        assert_eq!(manager.clear().len(), 2);
        assert!(manager.is_empty());
        assert!(manager.list_layers().is_empty());
    }
}

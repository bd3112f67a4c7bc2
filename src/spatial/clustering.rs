use crate::core::{
    constants::{CLUSTER_LARGE_THRESHOLD, CLUSTER_MEDIUM_THRESHOLD},
    geo::{LatLng, LatLngBounds},
    viewport::project,
};
use crate::spatial::index::{SpatialIndex, SpatialItem};
use crate::ui::style::ClusterTier;
use crate::{MapError, Result};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Anything that can be grouped into a cluster and carries a death count
pub trait ClusterMember {
    fn fatalities(&self) -> u32;
}

/// Represents a cluster of markers
#[derive(Debug, Clone)]
pub struct Cluster<T> {
    /// Unique identifier for the cluster
    pub id: String,
    /// Mean position of the members
    pub center: LatLng,
    /// Geographic bounds of the cluster
    pub bounds: LatLngBounds,
    /// Items in this cluster
    pub items: Vec<SpatialItem<T>>,
    /// Zoom level at which this cluster was created
    pub zoom_level: f64,
}

impl<T> Cluster<T> {
    /// Builds a cluster; `items` must not be empty
    pub fn new(id: String, items: Vec<SpatialItem<T>>, zoom_level: f64) -> Self {
        let bounds = LatLngBounds::from_points(items.iter().map(|item| item.position))
            .unwrap_or_else(|| LatLngBounds::new(LatLng::default(), LatLng::default()));
        let center = Self::mean_position(&items).unwrap_or_else(|| bounds.center());

        Self {
            id,
            center,
            bounds,
            items,
            zoom_level,
        }
    }

    fn mean_position(items: &[SpatialItem<T>]) -> Option<LatLng> {
        if items.is_empty() {
            return None;
        }
        let n = items.len() as f64;
        let (lat, lng) = items.iter().fold((0.0, 0.0), |(lat, lng), item| {
            (lat + item.position.lat, lng + item.position.lng)
        });
        Some(LatLng::new(lat / n, lng / n))
    }

    fn cell_id(grid_x: i64, grid_y: i64, chunk: Option<usize>) -> String {
        match chunk {
            Some(chunk) => format!("cluster_{grid_x}_{grid_y}__{chunk}"),
            None => format!("cluster_{grid_x}_{grid_y}"),
        }
    }

    /// Get the number of items in the cluster
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Check if this is a single-item cluster
    pub fn is_single(&self) -> bool {
        self.items.len() == 1
    }

    pub fn tier(&self, config: &ClusteringConfig) -> ClusterTier {
        ClusterTier::for_count(self.count(), config.medium_threshold, config.large_threshold)
    }
}

impl<T: ClusterMember> Cluster<T> {
    /// At least one member recorded a death
    pub fn has_fatal(&self) -> bool {
        self.items.iter().any(|item| item.data.fatalities() > 0)
    }

    pub fn fatality_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.data.fatalities()))
    }
}

/// Configuration for clustering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Side of a grid cell in screen pixels
    pub grid_size: f64,
    /// Zoom at and above which every point is shown on its own
    pub disable_clustering_at_zoom: Option<f64>,
    /// Cells holding more items than this are split into several clusters
    pub max_cluster_size: Option<usize>,
    /// Child count at which a badge becomes "medium"
    pub medium_threshold: usize,
    /// Child count at which a badge becomes "large"
    pub large_threshold: usize,
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(MapError::Config(format!(
                "cluster grid size must be positive, got {}",
                self.grid_size
            )));
        }
        if self.medium_threshold == 0 || self.medium_threshold >= self.large_threshold {
            return Err(MapError::Config(format!(
                "cluster thresholds must satisfy 0 < medium ({}) < large ({})",
                self.medium_threshold, self.large_threshold
            )));
        }
        if self.max_cluster_size == Some(0) {
            return Err(MapError::Config("max cluster size cannot be zero".into()));
        }
        Ok(())
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            grid_size: 50.0,
            disable_clustering_at_zoom: None,
            max_cluster_size: None,
            medium_threshold: CLUSTER_MEDIUM_THRESHOLD,
            large_threshold: CLUSTER_LARGE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
struct ClusterCache<T> {
    zoom: f64,
    region: Option<LatLngBounds>,
    clusters: Vec<Cluster<T>>,
}

/// Grid clustering of geographic items in projected pixel space
#[derive(Debug, Clone)]
pub struct Clustering<T> {
    config: ClusteringConfig,
    spatial_index: SpatialIndex<T>,
    cache: Option<ClusterCache<T>>,
}

impl<T: Clone> Clustering<T> {
    /// Create a new clustering instance
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            spatial_index: SpatialIndex::new(),
            cache: None,
        }
    }

    /// Indexes a whole batch at once
    pub fn with_items(config: ClusteringConfig, items: Vec<SpatialItem<T>>) -> Self {
        Self {
            config,
            spatial_index: SpatialIndex::bulk_load(items),
            cache: None,
        }
    }

    /// Add an item to the clustering system
    pub fn add_item(&mut self, item: SpatialItem<T>) {
        self.spatial_index.insert(item);
        self.invalidate_cache();
    }

    /// Clear all items
    pub fn clear(&mut self) {
        self.spatial_index.clear();
        self.invalidate_cache();
    }

    fn invalidate_cache(&mut self) {
        self.cache = None;
    }

    /// Clusters visible in `region` (all items when `None`) at `zoom`.
    ///
    /// Results for the same region and zoom are served from cache.
    pub fn get_clusters(&mut self, region: Option<&LatLngBounds>, zoom: f64) -> Vec<Cluster<T>> {
        if let Some(cache) = &self.cache {
            if (cache.zoom - zoom).abs() < 0.01 && cache.region.as_ref() == region {
                return cache.clusters.clone();
            }
        }

        let items = match region {
            Some(bounds) => self.spatial_index.query(bounds),
            None => self.spatial_index.all_items(),
        };

        let clustering_disabled = self
            .config
            .disable_clustering_at_zoom
            .map_or(false, |limit| zoom >= limit);

        let clusters = if clustering_disabled {
            let mut singles: Vec<_> = items
                .into_iter()
                .map(|item| Cluster::new(format!("single_{}", item.id), vec![item.clone()], zoom))
                .collect();
            singles.sort_by_key(|cluster| cluster.items[0].id);
            singles
        } else {
            self.grid_cluster(items, zoom)
        };

        self.cache = Some(ClusterCache {
            zoom,
            region: region.cloned(),
            clusters: clusters.clone(),
        });

        clusters
    }

    fn grid_cluster(&self, items: Vec<&SpatialItem<T>>, zoom: f64) -> Vec<Cluster<T>> {
        let grid_size = self.config.grid_size;
        let mut grid: FxHashMap<(i64, i64), Vec<SpatialItem<T>>> = FxHashMap::default();
        grid.reserve((items.len() / 4).max(16));

        for item in items {
            let px = project(&item.position, zoom);
            let cell = (
                (px.x / grid_size).floor() as i64,
                (px.y / grid_size).floor() as i64,
            );
            grid.entry(cell).or_default().push(item.clone());
        }

        // Stable output order regardless of hash layout
        let mut cells: Vec<_> = grid.into_iter().collect();
        cells.sort_by_key(|(cell, _)| *cell);

        let mut clusters = Vec::with_capacity(cells.len());
        for ((grid_x, grid_y), mut cell_items) in cells {
            cell_items.sort_by_key(|item| item.id);
            match self.config.max_cluster_size {
                Some(max) if cell_items.len() > max => {
                    for (i, chunk) in cell_items.chunks(max).enumerate() {
                        let id = Cluster::<T>::cell_id(grid_x, grid_y, Some(i));
                        clusters.push(Cluster::new(id, chunk.to_vec(), zoom));
                    }
                }
                _ => {
                    let id = Cluster::<T>::cell_id(grid_x, grid_y, None);
                    clusters.push(Cluster::new(id, cell_items, zoom));
                }
            }
        }

        clusters
    }

    pub fn get_all_items(&self) -> Vec<&SpatialItem<T>> {
        self.spatial_index.all_items()
    }

    /// Geographic extent of every indexed item
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.spatial_index.bounds()
    }

    pub fn len(&self) -> usize {
        self.spatial_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spatial_index.is_empty()
    }

    /// Update the clustering configuration
    pub fn set_config(&mut self, config: ClusteringConfig) {
        self.config = config;
        self.invalidate_cache();
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }
}

impl<T: Clone> Default for Clustering<T> {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}

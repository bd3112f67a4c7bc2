use crate::core::{
    geo::{LatLng, LatLngBounds},
    viewport::Viewport,
};
use crate::data::point::AccidentPoint;
use crate::layers::base::{LayerProperties, LayerType, RenderGeneration};
use crate::spatial::{
    clustering::{ClusterMember, Clustering, ClusteringConfig},
    index::SpatialItem,
};
use crate::ui::{
    popup::PopupContent,
    style::{ClusterPalette, ClusterStyle, ClusterTier, MarkerSeverity},
};
use crate::{MapError, Result};

/// A single accident marker inside the cluster layer
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMarker {
    pub point_id: u64,
    pub position: LatLng,
    pub fatalities: u32,
    pub injuries: u32,
    pub severity: MarkerSeverity,
    pub popup: PopupContent,
}

impl ClusterMarker {
    pub fn from_point(point: &AccidentPoint) -> Result<Self> {
        let position = point
            .position()
            .filter(LatLng::is_valid)
            .ok_or_else(|| {
                MapError::InvalidGeometry(format!(
                    "accident {} has no placeable coordinates ({:?}, {:?})",
                    point.id, point.latitude, point.longitude
                ))
            })?;

        Ok(Self {
            point_id: point.id,
            position,
            fatalities: point.fatalities,
            injuries: point.injuries,
            severity: point.severity(),
            popup: PopupContent::for_point(point),
        })
    }
}

impl ClusterMember for ClusterMarker {
    fn fatalities(&self) -> u32 {
        self.fatalities
    }
}

/// What a host draws for one cluster at the current view
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterView {
    pub id: String,
    pub center: LatLng,
    pub count: usize,
    /// Any member recorded a death
    pub fatal: bool,
    pub fatality_count: u32,
    pub tier: ClusterTier,
    pub style: ClusterStyle,
    /// Text inside the badge
    pub badge: String,
    /// The marker itself when the cluster has one member
    pub single: Option<ClusterMarker>,
}

/// Proximity-clustered accident markers
#[derive(Debug, Clone)]
pub struct ClusterLayer {
    properties: LayerProperties,
    markers: Vec<ClusterMarker>,
    clustering: Clustering<ClusterMarker>,
    palette: ClusterPalette,
}

impl ClusterLayer {
    pub fn build(
        points: &[&AccidentPoint],
        config: &ClusteringConfig,
        generation: RenderGeneration,
    ) -> Result<Self> {
        config.validate()?;

        let markers = points
            .iter()
            .map(|point| ClusterMarker::from_point(point))
            .collect::<Result<Vec<_>>>()?;

        let items = markers
            .iter()
            .map(|marker| SpatialItem::new(marker.point_id, marker.position, marker.clone()))
            .collect();

        Ok(Self {
            properties: LayerProperties::new(LayerType::Clusters, generation),
            markers,
            clustering: Clustering::with_items(config.clone(), items),
            palette: ClusterPalette::default(),
        })
    }

    pub fn with_palette(mut self, palette: ClusterPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    pub fn markers(&self) -> &[ClusterMarker] {
        &self.markers
    }

    pub fn config(&self) -> &ClusteringConfig {
        self.clustering.config()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.clustering.bounds()
    }

    pub fn fatal_marker_count(&self) -> usize {
        self.markers.iter().filter(|m| m.fatalities > 0).count()
    }

    /// Clusters intersecting the viewport at its zoom
    pub fn clusters_at(&mut self, viewport: &Viewport) -> Vec<ClusterView> {
        let region = viewport.bounds();
        self.clusters_in(Some(&region), viewport.zoom)
    }

    /// Clusters of every marker at `zoom`
    pub fn all_clusters(&mut self, zoom: f64) -> Vec<ClusterView> {
        self.clusters_in(None, zoom)
    }

    fn clusters_in(&mut self, region: Option<&LatLngBounds>, zoom: f64) -> Vec<ClusterView> {
        let config = self.clustering.config().clone();
        self.clustering
            .get_clusters(region, zoom)
            .into_iter()
            .map(|cluster| {
                let fatal = cluster.has_fatal();
                let tier = cluster.tier(&config);
                ClusterView {
                    fatality_count: cluster.fatality_count(),
                    style: *self.palette.style_for(tier, fatal),
                    badge: cluster.count().to_string(),
                    single: if cluster.is_single() {
                        cluster.items.first().map(|item| item.data.clone())
                    } else {
                        None
                    },
                    count: cluster.count(),
                    center: cluster.center,
                    id: cluster.id,
                    fatal,
                    tier,
                }
            })
            .collect()
    }
}

use crate::core::geo::{LatLng, LatLngBounds};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A geographic point item that can be indexed via an R-tree.
/// Stored as `[lng, lat]` so the x axis is longitude.
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: u64,
    pub position: LatLng,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: u64, position: LatLng, data: T) -> Self {
        Self { id, position, data }
    }

    fn coords(&self) -> [f64; 2] {
        [self.position.lng, self.position.lat]
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for SpatialItem<T> {}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords())
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [x, y] = self.coords();
        let dx = x - point[0];
        let dy = y - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree backed index of geographic points
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
    bounds: Option<LatLngBounds>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
            bounds: None,
        }
    }

    /// Builds the tree in one pass; much faster than repeated inserts for a fresh batch
    pub fn bulk_load(items: Vec<SpatialItem<T>>) -> Self {
        let bounds = LatLngBounds::from_points(items.iter().map(|item| item.position));
        Self {
            rtree: RTree::bulk_load(items),
            bounds,
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) {
        match self.bounds {
            Some(ref mut b) => b.extend(&item.position),
            None => self.bounds = Some(LatLngBounds::new(item.position, item.position)),
        }
        self.rtree.insert(item);
    }

    /// Items inside `bounds` (inclusive)
    pub fn query(&self, bounds: &LatLngBounds) -> Vec<&SpatialItem<T>> {
        let envelope = AABB::from_corners(
            [bounds.south_west.lng, bounds.south_west.lat],
            [bounds.north_east.lng, bounds.north_east.lat],
        );
        self.rtree.locate_in_envelope_intersecting(&envelope).collect()
    }

    /// Items within `radius` degrees of `center`
    pub fn query_radius(&self, center: &LatLng, radius: f64) -> Vec<&SpatialItem<T>> {
        self.rtree
            .locate_within_distance([center.lng, center.lat], radius * radius)
            .collect()
    }

    pub fn all_items(&self) -> Vec<&SpatialItem<T>> {
        self.rtree.iter().collect()
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.bounds.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
        self.bounds = None;
    }

    pub fn get(&self, id: u64) -> Option<&SpatialItem<T>> {
        self.rtree.iter().find(|item| item.id == id)
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

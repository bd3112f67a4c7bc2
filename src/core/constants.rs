//! Core constants derived from the accident dashboard's Leaflet maps and common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels; the projected world is this wide at zoom 0.
pub const TILE_SIZE: f64 = 256.0;

/// Web Mercator latitude limit.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Brasília. The dashboard opens centered on the federal capital.
pub const DEFAULT_CENTER: (f64, f64) = (-15.793889, -47.882778);

/// Country-level zoom used before any data has been fitted.
pub const DEFAULT_ZOOM: f64 = 5.0;

pub const MIN_ZOOM: f64 = 0.0;

pub const MAX_ZOOM: f64 = 18.0;

/// Zoom applied when every point shares one coordinate and a bounds-fit is degenerate.
pub const SINGLE_POINT_ZOOM: f64 = 14.0;

/// Symmetric bounds-fit padding (pixels) of the full-screen map.
pub const FIT_PADDING_PX: f64 = 50.0;

/// Lower bound of the post-gesture debounce window.
pub const MIN_SETTLE_DELAY_MS: u64 = 300;

/// Debounce window absorbing rapid sequential zoom steps.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Clusters with at least this many children use the medium tier.
pub const CLUSTER_MEDIUM_THRESHOLD: usize = 10;

/// Clusters with at least this many children use the large tier.
pub const CLUSTER_LARGE_THRESHOLD: usize = 100;

/// A heat gradient needs this many stops to read from "low" to "critical".
pub const MIN_GRADIENT_STOPS: usize = 4;

/// Default container size of the headless surface.
pub const DEFAULT_SURFACE_SIZE: (f64, f64) = (800.0, 600.0);

use crate::core::{
    constants::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE},
    geo::{LatLng, LatLngBounds, Point},
};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Projects a LatLng to world pixel coordinates at the given zoom level (EPSG:3857)
pub fn project(lat_lng: &LatLng, zoom: f64) -> Point {
    let scale = TILE_SIZE * 2_f64.powf(zoom);
    let lat_rad = LatLng::clamp_lat(lat_lng.lat).to_radians();

    let x = (lat_lng.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * scale;

    Point::new(x, y)
}

/// Unprojects world pixel coordinates back to LatLng at the given zoom level
pub fn unproject(pixel: &Point, zoom: f64) -> LatLng {
    let scale = TILE_SIZE * 2_f64.powf(zoom);

    let lng = pixel.x / scale * 360.0 - 180.0;
    let n = PI - 2.0 * PI * pixel.y / scale;
    let lat = n.sinh().atan().to_degrees();

    LatLng::new(lat, lng)
}

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center: Self::clamp_center(center),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            size,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }

    /// Sets the center of the viewport, clamped to the projectable world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// A container with zero width or height cannot host a map
    pub fn has_area(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let origin = project(&self.center, self.zoom);
        project(lat_lng, self.zoom)
            .subtract(&origin)
            .add(&self.half_size())
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let origin = project(&self.center, self.zoom);
        let world = pixel.subtract(&self.half_size()).add(&origin);
        unproject(&world, self.zoom)
    }

    /// Pans the viewport so map content follows a pointer moved by `delta` pixels
    pub fn pan(&mut self, delta: Point) {
        let center_px = project(&self.center, self.zoom);
        let new_center = unproject(&center_px.subtract(&delta), self.zoom);
        self.set_center(LatLng::new(new_center.lat, LatLng::wrap_lng(new_center.lng)));
    }

    /// Zooms to `zoom`, keeping the coordinate under `focus` (container pixels) in place
    pub fn zoom_around(&mut self, zoom: f64, focus: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < 0.001 {
            return;
        }

        match focus {
            Some(focus_screen) => {
                let focus_lat_lng = self.pixel_to_lat_lng(&focus_screen);
                self.zoom = new_zoom;

                let focus_world = project(&focus_lat_lng, new_zoom);
                let center_world = focus_world
                    .subtract(&focus_screen)
                    .add(&self.half_size());
                self.set_center(unproject(&center_world, new_zoom));
            }
            None => self.zoom = new_zoom,
        }
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Largest integer zoom at which `bounds` fits inside the viewport minus `padding` on every side
    pub fn fit_zoom(&self, bounds: &LatLngBounds, padding: f64) -> Result<f64> {
        if !bounds.is_valid() {
            return Err(MapError::InvalidGeometry(format!(
                "cannot fit non-finite or inverted bounds {:?}",
                bounds
            )));
        }

        let available = Point::new(self.size.x - 2.0 * padding, self.size.y - 2.0 * padding);
        if available.x <= 0.0 || available.y <= 0.0 {
            return Err(MapError::InvalidGeometry(format!(
                "padding {padding}px leaves no room in a {}x{} viewport",
                self.size.x, self.size.y
            )));
        }

        let north_west = LatLng::new(bounds.north_east.lat, bounds.south_west.lng);
        let south_east = LatLng::new(bounds.south_west.lat, bounds.north_east.lng);

        let mut best_zoom = self.min_zoom;
        for test_zoom in (self.min_zoom.ceil() as i32)..=(self.max_zoom.floor() as i32) {
            let zoom = test_zoom as f64;
            let nw = project(&north_west, zoom);
            let se = project(&south_east, zoom);

            if (se.x - nw.x).abs() <= available.x && (se.y - nw.y).abs() <= available.y {
                best_zoom = zoom;
            } else {
                break;
            }
        }

        Ok(best_zoom)
    }

    /// Fits the viewport to contain the given bounds with symmetric pixel padding
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) -> Result<()> {
        let zoom = self.fit_zoom(bounds, padding)?;

        // Center in projected space so the padding stays symmetric on screen
        let nw = project(
            &LatLng::new(bounds.north_east.lat, bounds.south_west.lng),
            zoom,
        );
        let se = project(
            &LatLng::new(bounds.south_west.lat, bounds.north_east.lng),
            zoom,
        );
        let mid = Point::new((nw.x + se.x) / 2.0, (nw.y + se.y) / 2.0);

        self.set_zoom(zoom);
        self.set_center(unproject(&mid, zoom));
        Ok(())
    }

    /// Gets the resolution in meters per pixel at the current zoom level
    pub fn resolution(&self) -> f64 {
        let earth_circumference = 40_075_016.0;
        earth_circumference / (TILE_SIZE * 2_f64.powf(self.zoom))
    }

    fn half_size(&self) -> Point {
        Point::new(self.size.x / 2.0, self.size.y / 2.0)
    }

    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(LatLng::clamp_lat(center.lat), center.lng.clamp(-180.0, 180.0))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        use crate::core::constants::{DEFAULT_CENTER, DEFAULT_SURFACE_SIZE, DEFAULT_ZOOM};
        Self::new(
            LatLng::from(DEFAULT_CENTER),
            DEFAULT_ZOOM,
            Point::new(DEFAULT_SURFACE_SIZE.0, DEFAULT_SURFACE_SIZE.1),
        )
    }
}

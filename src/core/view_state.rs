use crate::core::{
    config::ViewConfig,
    geo::{LatLng, LatLngBounds},
};
use crate::data::{filter::FilterContext, point::AccidentPoint};
use crate::input::gate::InteractionState;
use crate::surface::MapSurface;
use crate::Result;
use instant::Instant;
use serde::{Deserialize, Serialize};

/// Camera position the user navigated to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapViewState {
    pub center: LatLng,
    pub zoom: f64,
}

impl MapViewState {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self { center, zoom }
    }

    /// Equal within `epsilon` on every component
    pub fn approx_eq(&self, other: &MapViewState, epsilon: f64) -> bool {
        (self.center.lat - other.center.lat).abs() <= epsilon
            && (self.center.lng - other.center.lng).abs() <= epsilon
            && (self.zoom - other.zoom).abs() <= epsilon
    }
}

/// Decides between fitting the data and keeping the user's view.
///
/// The first successful load for a filter context fits the view to the
/// points; later refreshes of the same context restore whatever the user
/// panned or zoomed to.
#[derive(Debug, Clone)]
pub struct ViewStateManager {
    config: ViewConfig,
    loaded_context: Option<FilterContext>,
}

impl ViewStateManager {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            loaded_context: None,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn default_view(&self) -> MapViewState {
        MapViewState::new(self.config.default_center, self.config.default_zoom)
    }

    pub fn capture_current<S: MapSurface + ?Sized>(&self, surface: &S) -> MapViewState {
        surface.view()
    }

    /// Jumps back to `state`; never counts as a user interaction
    pub fn restore_to<S: MapSurface + ?Sized>(&self, surface: &mut S, state: MapViewState) {
        surface.set_view(state);
    }

    /// No successful load has happened yet for `context`
    pub fn is_first_load(&self, context: &FilterContext) -> bool {
        self.loaded_context.as_ref() != Some(context)
    }

    pub fn mark_loaded(&mut self, context: &FilterContext) {
        self.loaded_context = Some(context.clone());
    }

    pub fn loaded_context(&self) -> Option<&FilterContext> {
        self.loaded_context.as_ref()
    }

    /// Forget the loaded context so the next load fits again
    pub fn reset(&mut self) {
        self.loaded_context = None;
    }

    /// Frames `points` on the surface.
    ///
    /// Returns `None` without touching the surface while `interaction` blocks
    /// or when there is nothing to frame. A set with one unique coordinate is
    /// centered at the single-point zoom instead of being fitted.
    pub fn fit_to_points<S: MapSurface + ?Sized>(
        &self,
        surface: &mut S,
        points: &[&AccidentPoint],
        context: &FilterContext,
        interaction: &InteractionState,
        now: Instant,
    ) -> Result<Option<MapViewState>> {
        if interaction.is_blocking_at(now) {
            log::debug!("skipping bounds fit while the user is interacting");
            return Ok(None);
        }

        let focus = context.focus_points(points);
        let bounds = match LatLngBounds::from_points(focus.iter().filter_map(|p| p.position())) {
            Some(bounds) => bounds,
            None => return Ok(None),
        };

        if bounds.is_degenerate() {
            let state = MapViewState::new(bounds.center(), self.config.single_point_zoom);
            surface.set_view(state);
            return Ok(Some(state));
        }

        let state = surface.fit_bounds(&bounds, self.config.fit_padding)?;
        log::debug!(
            "fitted {} point(s) at zoom {} around {:?}",
            focus.len(),
            state.zoom,
            state.center
        );
        Ok(Some(state))
    }
}

impl Default for ViewStateManager {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;
    use crate::data::point::AccidentDetails;
    use crate::surface::headless::HeadlessSurface;

    fn surface() -> HeadlessSurface {
        let mut surface = HeadlessSurface::new(Point::new(800.0, 600.0));
        surface.attach().unwrap();
        surface
    }

    fn on_road(id: u64, lat: f64, lng: f64, road: &str) -> AccidentPoint {
        AccidentPoint::new(id, lat, lng).with_details(AccidentDetails {
            road: road.into(),
            ..AccidentDetails::default()
        })
    }

    #[test]
    fn test_first_load_tracking() {
        let mut manager = ViewStateManager::default();
        let sp = FilterContext::new().with_state("SP");
        let rj = FilterContext::new().with_state("RJ");

        assert!(manager.is_first_load(&sp));
        manager.mark_loaded(&sp);
        assert!(!manager.is_first_load(&sp));
        assert!(manager.is_first_load(&rj));

        manager.reset();
        assert!(manager.is_first_load(&sp));
    }

    #[test]
    fn test_capture_and_restore() {
        let manager = ViewStateManager::default();
        let mut surface = surface();
        let state = MapViewState::new(LatLng::new(-22.9, -43.2), 12.0);

        manager.restore_to(&mut surface, state);
        assert_eq!(manager.capture_current(&surface), state);
    }

    #[test]
    fn test_fit_frames_all_points() {
        let manager = ViewStateManager::default();
        let mut surface = surface();
        let points = vec![
            AccidentPoint::new(1, -23.5, -46.6),
            AccidentPoint::new(2, -22.9, -43.2),
        ];
        let refs: Vec<_> = points.iter().collect();

        let state = manager
            .fit_to_points(
                &mut surface,
                &refs,
                &FilterContext::new(),
                &InteractionState::idle(),
                Instant::now(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(surface.view(), state);
        let visible = surface.viewport().bounds();
        for p in &points {
            assert!(visible.contains(&p.position().unwrap()));
        }
    }

    #[test]
    fn test_single_coordinate_uses_default_zoom() {
        let manager = ViewStateManager::default();
        let mut surface = surface();
        let points = vec![
            AccidentPoint::new(1, -15.8, -47.9),
            AccidentPoint::new(2, -15.8, -47.9),
        ];
        let refs: Vec<_> = points.iter().collect();

        let state = manager
            .fit_to_points(
                &mut surface,
                &refs,
                &FilterContext::new(),
                &InteractionState::idle(),
                Instant::now(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(state, MapViewState::new(LatLng::new(-15.8, -47.9), 14.0));
    }

    #[test]
    fn test_no_fit_while_blocking_or_empty() {
        let manager = ViewStateManager::default();
        let mut surface = surface();
        let before = surface.view();
        let now = Instant::now();
        let points = vec![AccidentPoint::new(1, -3.1, -60.0)];
        let refs: Vec<_> = points.iter().collect();

        let busy = InteractionState {
            is_interacting: true,
            settle_deadline: None,
        };
        let ctx = FilterContext::new();
        assert_eq!(
            manager.fit_to_points(&mut surface, &refs, &ctx, &busy, now).unwrap(),
            None
        );
        assert_eq!(
            manager
                .fit_to_points(&mut surface, &[], &ctx, &InteractionState::idle(), now)
                .unwrap(),
            None
        );
        assert_eq!(surface.view(), before);
    }

    #[test]
    fn test_fit_narrows_to_selected_road() {
        let manager = ViewStateManager::default();
        let mut surface = surface();
        let points = vec![
            on_road(1, -23.5, -46.6, "116"),
            on_road(2, -3.1, -60.0, "174"),
        ];
        let refs: Vec<_> = points.iter().collect();

        let state = manager
            .fit_to_points(
                &mut surface,
                &refs,
                &FilterContext::new().with_road("174"),
                &InteractionState::idle(),
                Instant::now(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(state.center, LatLng::new(-3.1, -60.0));
    }
}

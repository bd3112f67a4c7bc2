use crashmap::layers::base::LayerType;
use crashmap::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// End-to-end scenarios for the controller driving an in-memory surface
#[cfg(test)]
mod map_view_scenarios {
    use super::*;

    /// Headless surface that can refuse to attach or refuse layers
    struct TestSurface {
        inner: HeadlessSurface,
        failed_attaches: u32,
        fail_attaches: u32,
        reject_layers: bool,
    }

    impl TestSurface {
        fn new() -> Self {
            Self {
                inner: HeadlessSurface::new(Point::new(800.0, 600.0)),
                failed_attaches: 0,
                fail_attaches: 0,
                reject_layers: false,
            }
        }

        fn failing_attach(times: u32) -> Self {
            Self {
                fail_attaches: times,
                ..Self::new()
            }
        }

        fn rejecting_layers() -> Self {
            Self {
                reject_layers: true,
                ..Self::new()
            }
        }
    }

    impl MapSurface for TestSurface {
        fn attach(&mut self) -> Result<()> {
            if self.failed_attaches < self.fail_attaches {
                self.failed_attaches += 1;
                return Err(MapError::WidgetUnavailable {
                    attempts: self.failed_attaches,
                    reason: "container is 0x0 pixels".into(),
                });
            }
            self.inner.attach()
        }

        fn detach(&mut self) {
            self.inner.detach()
        }

        fn is_attached(&self) -> bool {
            self.inner.is_attached()
        }

        fn add_layer(&mut self, layer: MapLayer) -> Result<LayerId> {
            if self.reject_layers {
                return Err(MapError::LayerConstruction {
                    mode: RenderMode::Heatmap,
                    point_count: layer.point_count(),
                    reason: "plugin missing".into(),
                });
            }
            self.inner.add_layer(layer)
        }

        fn remove_layer(&mut self, id: LayerId) -> Result<Option<MapLayer>> {
            self.inner.remove_layer(id)
        }

        fn layer_ids(&self) -> Vec<LayerId> {
            self.inner.layer_ids()
        }

        fn layer(&self, id: LayerId) -> Option<&MapLayer> {
            self.inner.layer(id)
        }

        fn view(&self) -> MapViewState {
            self.inner.view()
        }

        fn set_view(&mut self, state: MapViewState) {
            self.inner.set_view(state)
        }

        fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) -> Result<MapViewState> {
            self.inner.fit_bounds(bounds, padding)
        }

        fn pan_by(&mut self, delta: Point) {
            self.inner.pan_by(delta)
        }

        fn zoom_by(&mut self, delta: f64, focus: Option<Point>) {
            self.inner.zoom_by(delta, focus)
        }

        fn resize(&mut self, size: Point) {
            self.inner.resize(size)
        }

        fn size(&self) -> Point {
            self.inner.size()
        }
    }

    fn controller_with<S: MapSurface>(surface: S) -> (MapViewController<S>, ManualClock) {
        let clock = ManualClock::new();
        let controller =
            MapViewController::new(surface, MapViewConfig::default(), Arc::new(clock.clone()))
                .unwrap();
        (controller, clock)
    }

    fn attached() -> (MapViewController<HeadlessSurface>, ManualClock) {
        let (mut controller, clock) = controller_with(HeadlessSurface::new(Point::new(800.0, 600.0)));
        assert_eq!(controller.init().unwrap(), InitStatus::Attached);
        (controller, clock)
    }

    /// Drives `init` to completion, advancing the manual clock through each backoff
    fn drive_init<S: MapSurface>(
        controller: &mut MapViewController<S>,
        clock: &ManualClock,
    ) -> Result<u32> {
        loop {
            match controller.init()? {
                InitStatus::Attached => return Ok(controller.init_attempts()),
                InitStatus::RetryAfter(delay) => clock.advance(delay),
            }
        }
    }

    /// Points spread over south-eastern Brazil; every tenth one is fatal
    fn sao_paulo_batch(count: u64) -> Vec<AccidentPoint> {
        (0..count)
            .map(|i| {
                let lat = -23.0 - (i % 25) as f64 * 0.04;
                let lng = -46.0 - (i / 25) as f64 * 0.05;
                let fatalities = if i % 10 == 0 { 3 } else { 0 };
                AccidentPoint::new(i + 1, lat, lng).with_casualties(fatalities, (i % 3) as u32)
            })
            .collect()
    }

    fn on_road(id: u64, lat: f64, lng: f64, road: &str, state: &str) -> AccidentPoint {
        AccidentPoint::new(id, lat, lng).with_details(AccidentDetails {
            road: road.into(),
            state: state.into(),
            ..AccidentDetails::default()
        })
    }

    fn data_layer_count<S: MapSurface>(surface: &S) -> usize {
        surface.count_layers(LayerType::Heatmap) + surface.count_layers(LayerType::Clusters)
    }

    fn drag<S: MapSurface>(controller: &mut MapViewController<S>, dx: f64, dy: f64) {
        controller.handle_input(&InputEvent::DragStart {
            position: Point::new(400.0, 300.0),
        });
        controller.handle_input(&InputEvent::Drag {
            delta: Point::new(dx, dy),
        });
        controller.handle_input(&InputEvent::DragEnd);
    }

    /// 500 points with 50 fatal ones render as a single weighted heat layer
    #[test]
    fn test_heatmap_of_five_hundred_points() {
        let (mut controller, _) = attached();
        let points = sao_paulo_batch(500);
        assert_eq!(points.iter().filter(|p| p.has_fatalities()).count(), 50);

        let outcome = controller.update(&points, false, RenderMode::Heatmap, &FilterContext::new());
        assert_eq!(outcome, UpdateOutcome::Rendered(RenderGeneration(1)));

        let surface = controller.surface();
        assert_eq!(surface.count_layers(LayerType::Heatmap), 1);
        assert_eq!(surface.count_layers(LayerType::Clusters), 0);

        let id = surface.layer_ids()[0];
        let heat = surface.layer(id).and_then(MapLayer::as_heatmap).unwrap();
        assert_eq!(heat.len(), 500);

        let model = IntensityModel::default();
        assert!(model.weight_for(3, 0) > model.weight_for(0, 0));
        assert_eq!(controller.visible_point_count(), 500);
    }

    /// Null-island points are all rejected, so nothing is drawn
    #[test]
    fn test_all_points_at_origin_render_nothing() {
        let (mut controller, _) = attached();
        let points: Vec<_> = (1..=20).map(|id| AccidentPoint::new(id, 0.0, 0.0)).collect();

        let outcome = controller.update(&points, false, RenderMode::Clusters, &FilterContext::new());

        assert_eq!(outcome, UpdateOutcome::NoData);
        assert_eq!(controller.status(), &MapStatus::NoData);
        assert!(controller.renderer_state().is_empty());
        assert_eq!(controller.surface().count_layers(LayerType::Clusters), 0);
        assert_eq!(controller.generation(), RenderGeneration::INITIAL);
    }

    /// Every mode switch leaves at most one data layer, of the requested kind
    #[test]
    fn test_mode_exclusivity_across_switches() {
        let (mut controller, _) = attached();
        let points = sao_paulo_batch(60);
        let ctx = FilterContext::new();

        for mode in [
            RenderMode::Heatmap,
            RenderMode::Clusters,
            RenderMode::Clusters,
            RenderMode::None,
            RenderMode::Heatmap,
            RenderMode::Clusters,
        ] {
            controller.update(&points, false, mode, &ctx);
            let surface = controller.surface();
            assert!(data_layer_count(surface) <= 1);
            match mode {
                RenderMode::Heatmap => assert_eq!(surface.count_layers(LayerType::Heatmap), 1),
                RenderMode::Clusters => assert_eq!(surface.count_layers(LayerType::Clusters), 1),
                RenderMode::None => assert_eq!(data_layer_count(surface), 0),
            }
            assert_eq!(controller.renderer_state().mode(), mode);
        }
    }

    /// A loading update tears the layer down until data arrives
    #[test]
    fn test_loading_clears_layer() {
        let (mut controller, _) = attached();
        let ctx = FilterContext::new().with_year("2023");
        controller.update(&sao_paulo_batch(10), false, RenderMode::Heatmap, &ctx);

        let outcome = controller.apply(MapUpdate::loading(RenderMode::Heatmap, ctx));

        assert_eq!(outcome, UpdateOutcome::Loading);
        assert_eq!(controller.status(), &MapStatus::Loading);
        assert_eq!(data_layer_count(controller.surface()), 0);
        assert_eq!(controller.visible_point_count(), 0);
    }

    /// Refreshing the same context keeps the camera where the user left it
    #[test]
    fn test_view_preserved_for_same_context() {
        let (mut controller, clock) = attached();
        let ctx = FilterContext::new().with_state("SP");
        controller.update(&sao_paulo_batch(100), false, RenderMode::Heatmap, &ctx);

        drag(&mut controller, -150.0, 80.0);
        controller.handle_input(&InputEvent::Scroll {
            delta: 1.0,
            position: Point::new(200.0, 200.0),
        });
        clock.advance_ms(600);
        let navigated = controller.view();

        let outcome = controller.update(&sao_paulo_batch(40), false, RenderMode::Clusters, &ctx);

        assert_eq!(outcome, UpdateOutcome::Rendered(RenderGeneration(2)));
        assert!(controller.view().approx_eq(&navigated, 1e-9));
    }

    /// A new filter context fits the view to the new data
    #[test]
    fn test_refit_on_context_change() {
        let (mut controller, clock) = attached();
        controller.update(
            &sao_paulo_batch(50),
            false,
            RenderMode::Heatmap,
            &FilterContext::new().with_state("SP"),
        );
        drag(&mut controller, 300.0, 0.0);
        clock.advance_ms(600);
        let navigated = controller.view();

        let amazonas = vec![
            on_road(900, -3.10, -60.02, "174", "AM"),
            on_road(901, -2.60, -60.05, "174", "AM"),
            on_road(902, -3.40, -60.70, "319", "AM"),
        ];
        controller.update(
            &amazonas,
            false,
            RenderMode::Heatmap,
            &FilterContext::new().with_state("AM"),
        );

        assert!(!controller.view().approx_eq(&navigated, 1e-6));
        let visible = controller.surface().viewport().bounds();
        for point in &amazonas {
            assert!(visible.contains(&point.position().unwrap()));
        }
    }

    /// A selected road narrows the fit to that road's points
    #[test]
    fn test_fit_focuses_selected_road() {
        let (mut controller, _) = attached();
        let points = vec![
            on_road(1, -23.55, -46.63, "116", "SP"),
            on_road(2, -22.90, -43.20, "116", "RJ"),
            on_road(3, -15.80, -47.90, "040", "DF"),
        ];

        controller.update(
            &points,
            false,
            RenderMode::Clusters,
            &FilterContext::new().with_road("040"),
        );

        let view = controller.view();
        assert_eq!(view.center, LatLng::new(-15.80, -47.90));
        assert_eq!(view.zoom, controller.config().view.single_point_zoom);
    }

    /// Updates are dropped during a gesture and for the settle window after it
    #[test]
    fn test_gate_suppresses_updates() {
        let (mut controller, clock) = attached();
        let ctx = FilterContext::new();
        let points = sao_paulo_batch(30);

        controller.handle_input(&InputEvent::DragStart {
            position: Point::new(10.0, 10.0),
        });
        assert_eq!(
            controller.update(&points, false, RenderMode::Heatmap, &ctx),
            UpdateOutcome::Skipped
        );
        clock.advance_ms(2_000);
        assert!(controller.is_blocking());

        controller.handle_input(&InputEvent::DragEnd);
        clock.advance_ms(499);
        assert_eq!(
            controller.update(&points, false, RenderMode::Heatmap, &ctx),
            UpdateOutcome::Skipped
        );
        assert_eq!(data_layer_count(controller.surface()), 0);

        clock.advance_ms(1);
        assert_eq!(
            controller.update(&points, false, RenderMode::Heatmap, &ctx),
            UpdateOutcome::Rendered(RenderGeneration(1))
        );
    }

    /// Two rapid updates leave only the second one on the map
    #[test]
    fn test_rapid_updates_last_one_wins() {
        let (controller, _) = attached();
        let shared = SharedMapView::new(controller);
        let ctx = FilterContext::new();

        shared.submit(MapUpdate::new(sao_paulo_batch(80), RenderMode::Heatmap, ctx.clone()));
        shared.submit(MapUpdate::new(sao_paulo_batch(12), RenderMode::Clusters, ctx));

        shared.with(|controller| {
            let surface = controller.surface();
            assert_eq!(data_layer_count(surface), 1);
            let id = surface.layer_ids()[0];
            let layer = surface.layer(id).unwrap();
            assert_eq!(layer.layer_type(), LayerType::Clusters);
            assert_eq!(layer.point_count(), 12);
            assert_eq!(layer.generation(), controller.generation());
        });
    }

    /// An update submitted while another is being applied is picked up by the holder
    #[test]
    fn test_reentrant_submit_is_applied_by_holder() {
        let (controller, _) = attached();
        let shared = SharedMapView::new(controller);
        let fired = Arc::new(AtomicBool::new(false));

        let inner = shared.clone();
        let flag = Arc::clone(&fired);
        shared.with(|controller| {
            controller.on_render(move |_| {
                if !flag.swap(true, Ordering::SeqCst) {
                    let queued = inner.submit(MapUpdate::new(
                        sao_paulo_batch(7),
                        RenderMode::Clusters,
                        FilterContext::new(),
                    ));
                    assert_eq!(queued, None);
                }
            })
        });

        let outcome = shared.submit(MapUpdate::new(
            sao_paulo_batch(70),
            RenderMode::Heatmap,
            FilterContext::new(),
        ));

        assert_eq!(outcome, Some(UpdateOutcome::Rendered(RenderGeneration(2))));
        assert_eq!(
            shared.status(),
            MapStatus::Ready {
                generation: RenderGeneration(2),
                point_count: 7
            }
        );
    }

    /// A widget that needs a few frames to get a size attaches after that many retries
    #[test]
    fn test_init_retries_until_attached() {
        let (mut controller, clock) = controller_with(TestSurface::failing_attach(3));

        assert_eq!(
            controller.init().unwrap(),
            InitStatus::RetryAfter(Duration::from_millis(100))
        );
        // Calling again before the backoff elapses does not touch the widget
        clock.advance_ms(40);
        assert_eq!(
            controller.init().unwrap(),
            InitStatus::RetryAfter(Duration::from_millis(60))
        );
        assert_eq!(controller.init_attempts(), 1);

        assert_eq!(drive_init(&mut controller, &clock).unwrap(), 4);
        assert_eq!(controller.surface().failed_attaches, 3);
        assert!(controller.is_attached());
        let view = &controller.config().view;
        let expected = MapViewState::new(view.default_center, view.default_zoom);
        assert_eq!(controller.view(), expected);
    }

    /// A widget that never gets a size fails after the configured retries
    #[test]
    fn test_init_gives_up_after_max_retries() {
        let (mut controller, clock) = controller_with(HeadlessSurface::new(Point::new(0.0, 0.0)));
        let started = clock.elapsed();

        let err = drive_init(&mut controller, &clock).unwrap_err();

        assert!(matches!(err, MapError::WidgetUnavailable { attempts: 6, .. }));
        assert!(matches!(controller.status(), MapStatus::Failed { .. }));
        assert!(controller.last_error().unwrap().contains("0x0"));
        // 100 + 200 + 400 + 800 + 1600 ms of backoff
        assert_eq!(clock.elapsed() - started, Duration::from_millis(3_100));

        // Later calls keep reporting the failure without retrying
        assert!(controller.init().is_err());
        assert_eq!(controller.init_attempts(), 6);
    }

    /// An update that arrives before the widget is ready is rendered once it attaches
    #[test]
    fn test_update_waits_for_attach() {
        let (mut controller, clock) = controller_with(TestSurface::failing_attach(1));
        assert_eq!(controller.init().unwrap(), InitStatus::RetryAfter(Duration::from_millis(100)));

        let ctx = FilterContext::new();
        assert_eq!(
            controller.update(&sao_paulo_batch(5), false, RenderMode::Clusters, &ctx),
            UpdateOutcome::Deferred
        );

        drive_init(&mut controller, &clock).unwrap();
        assert_eq!(controller.surface().count_layers(LayerType::Clusters), 1);
        assert_eq!(controller.visible_point_count(), 5);
    }

    /// A surface that refuses layers leaves the map empty and reports the failure
    #[test]
    fn test_layer_failure_reports_status() {
        let (mut controller, _) = controller_with(TestSurface::rejecting_layers());
        controller.init().unwrap();
        let events = controller.subscribe();

        let outcome = controller.update(
            &sao_paulo_batch(25),
            false,
            RenderMode::Heatmap,
            &FilterContext::new(),
        );

        assert_eq!(outcome, UpdateOutcome::Failed);
        assert!(controller.renderer_state().is_empty());
        assert!(matches!(controller.status(), MapStatus::Failed { .. }));
        assert!(controller.last_error().unwrap().contains("25 point(s)"));
        assert_eq!(controller.generation(), RenderGeneration::INITIAL);
        assert!(events.try_recv().is_err());
    }

    /// Backend JSON with mixed coordinate quality renders only the usable rows
    #[test]
    fn test_backend_payload_to_clusters() {
        let json = r#"[
            {"id": 1, "latitude": -23.5, "longitude": -46.6, "mortos": 2, "feridos": 1},
            {"id": 2, "latitude": null, "longitude": -46.6, "mortos": 0, "feridos": 0},
            {"id": 3, "latitude": 0.0, "longitude": 0.0, "mortos": 0, "feridos": 0},
            {"id": 4, "latitude": -23.51, "longitude": -46.61, "mortos": 0, "feridos": 3}
        ]"#;
        let points = AccidentPoint::parse_batch(json).unwrap();
        let (mut controller, _) = attached();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.on_render(move |event| sink.lock().unwrap().push(*event));

        controller.update(&points, false, RenderMode::Clusters, &FilterContext::new());

        assert_eq!(controller.visible_point_count(), 2);
        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].point_count, 2);
        assert_eq!(events[0].mode, RenderMode::Clusters);
    }
}

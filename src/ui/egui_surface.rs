use crate::core::{
    geo::{LatLngBounds, Point},
    view_state::MapViewState,
    viewport::Viewport,
};
use crate::input::events::InputEvent;
use crate::layers::{
    base::{LayerId, MapLayer},
    cluster::{ClusterMarker, ClusterView},
};
use crate::surface::{headless::HeadlessSurface, MapSurface};
use crate::ui::{
    popup::{PopupContent, PopupRow},
    style::MapStyle,
};
use crate::Result;
use egui::{Align2, Color32, FontId, Pos2, Rect, Response, RichText, Sense, Stroke, Ui, Vec2};

/// Wheel travel, in points, that counts as one zoom level
const SCROLL_POINTS_PER_ZOOM: f32 = 120.0;

/// Map surface painted into an egui `Ui`.
///
/// Camera and layer bookkeeping is delegated to a [`HeadlessSurface`]; this
/// type adds painting and turns egui pointer input into [`InputEvent`]s for
/// the controller.
#[derive(Debug)]
pub struct EguiSurface {
    inner: HeadlessSurface,
    style: MapStyle,
}

impl EguiSurface {
    pub fn new(style: MapStyle) -> Self {
        Self {
            inner: HeadlessSurface::default(),
            style,
        }
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    pub fn viewport(&self) -> &Viewport {
        self.inner.viewport()
    }

    /// Paints the map into the remaining space of `ui`.
    ///
    /// Returns the widget response and the gestures seen this frame. Feed the
    /// events to `MapViewController::handle_input`; the surface does not move
    /// the camera by itself.
    pub fn show(&mut self, ui: &mut Ui) -> (Response, Vec<InputEvent>) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let mut events = Vec::new();

        let size = Point::new(rect.width() as f64, rect.height() as f64);
        if size != self.inner.size() {
            events.push(InputEvent::Resize { size });
        }

        let local = |pos: Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                events.push(InputEvent::DragStart { position: local(pos) });
            }
        }
        if response.dragged() {
            let delta = response.drag_delta();
            if delta.length_sq() > 0.0 {
                events.push(InputEvent::Drag {
                    delta: Point::new(delta.x as f64, delta.y as f64),
                });
            }
        }
        if response.drag_released() {
            events.push(InputEvent::DragEnd);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.1 {
                if let Some(pos) = response.hover_pos() {
                    events.push(InputEvent::Scroll {
                        delta: (scroll / SCROLL_POINTS_PER_ZOOM) as f64,
                        position: local(pos),
                    });
                }
            }
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                events.push(InputEvent::Click { position: local(pos) });
            }
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from(self.style.background_color));

        let viewport = self.inner.viewport().clone();
        let style = self.style.clone();
        let mut hovered_popup = None;
        let hover = response.hover_pos().map(local);

        for id in self.inner.layer_ids() {
            match self.inner.layer_mut(id) {
                Some(MapLayer::Heatmap(heat)) => {
                    let config = heat.config().clone();
                    let grid = heat.density_grid(&viewport);
                    let cell = grid.cell_size as f32;
                    for (center, value) in grid.hot_cells() {
                        let color = config.color_at(value);
                        if color.a == 0 {
                            continue;
                        }
                        let min = rect.min + Vec2::new(center.x as f32, center.y as f32)
                            - Vec2::splat(cell / 2.0);
                        painter.rect_filled(
                            Rect::from_min_size(min, Vec2::splat(cell)),
                            0.0,
                            Color32::from(color),
                        );
                    }
                }
                Some(MapLayer::Clusters(clusters)) => {
                    for view in clusters.clusters_at(&viewport) {
                        let pixel = viewport.lat_lng_to_pixel(&view.center);
                        let pos = rect.min + Vec2::new(pixel.x as f32, pixel.y as f32);
                        match &view.single {
                            Some(marker) => {
                                paint_marker(&painter, pos, marker, &style);
                                if hover.map_or(false, |h| {
                                    h.distance_to(&pixel) <= style.marker_radius as f64
                                }) {
                                    hovered_popup = Some(marker.popup.clone());
                                }
                            }
                            None => paint_cluster(&painter, pos, &view),
                        }
                    }
                }
                None => {}
            }
        }

        let response = match hovered_popup {
            Some(popup) => response.on_hover_ui_at_pointer(|ui| show_popup(ui, &popup)),
            None => response,
        };

        (response, events)
    }
}

impl Default for EguiSurface {
    fn default() -> Self {
        Self::new(MapStyle::default())
    }
}

fn paint_marker(painter: &egui::Painter, pos: Pos2, marker: &ClusterMarker, style: &MapStyle) {
    painter.circle_filled(
        pos,
        style.marker_radius,
        Color32::from(marker.severity.marker_color()),
    );
    painter.circle_stroke(
        pos,
        style.marker_radius,
        Stroke::new(1.5, Color32::from(style.marker_outline)),
    );
}

fn paint_cluster(painter: &egui::Painter, pos: Pos2, view: &ClusterView) {
    let outer = view.style.diameter / 2.0;
    painter.circle_filled(pos, outer, Color32::from(view.style.halo));
    painter.circle_filled(pos, outer - 5.0, Color32::from(view.style.fill));
    painter.text(
        pos,
        Align2::CENTER_CENTER,
        &view.badge,
        FontId::proportional(12.0),
        Color32::from(view.style.text),
    );
}

fn show_popup(ui: &mut Ui, popup: &PopupContent) {
    ui.label(
        RichText::new(&popup.title)
            .strong()
            .color(Color32::from(popup.header_color())),
    );
    ui.separator();
    let row = |ui: &mut Ui, row: &PopupRow| {
        ui.label(format!("{}: {}", row.label, row.value));
    };
    popup.details.iter().for_each(|r| row(ui, r));
    egui::Frame::none()
        .fill(Color32::from(popup.casualty_background()))
        .inner_margin(4.0)
        .show(ui, |ui| popup.casualties.iter().for_each(|r| row(ui, r)));
    popup.notes.iter().for_each(|r| row(ui, r));
}

impl MapSurface for EguiSurface {
    fn attach(&mut self) -> Result<()> {
        self.inner.attach()
    }

    fn detach(&mut self) {
        self.inner.detach()
    }

    fn is_attached(&self) -> bool {
        self.inner.is_attached()
    }

    fn add_layer(&mut self, layer: MapLayer) -> Result<LayerId> {
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

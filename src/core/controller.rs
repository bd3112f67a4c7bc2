//! Orchestration of one interactive map surface
//!
//! [`MapViewController`] owns the surface and every piece of per-map state:
//! the active layer, the user's camera, the interaction gate and the render
//! generation. Each call to [`MapViewController::update`] runs the whole
//! pipeline to completion before returning.

use crate::core::{
    clock::Clock,
    config::MapViewConfig,
    view_state::{MapViewState, ViewStateManager},
};
use crate::data::{filter::FilterContext, point::AccidentPoint, validation::CoordinateValidator};
use crate::input::{
    events::InputEvent,
    gate::{InteractionGate, InteractionState},
};
use crate::layers::{
    base::{RenderGeneration, RenderMode},
    renderer::{LayerRenderer, RendererState},
};
use crate::surface::MapSurface;
use crate::{MapError, Result};
use crossbeam_channel::{Receiver, Sender};
use instant::Instant;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

/// What the host should show around the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapStatus {
    Uninitialized,
    Loading,
    NoData,
    Ready {
        generation: RenderGeneration,
        point_count: usize,
    },
    Failed {
        reason: String,
    },
}

/// Result of one initialization attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Attached,
    /// The widget was not ready; try again after the delay
    RetryAfter(Duration),
}

/// What an update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The surface is not attached yet; the update is applied on attach
    Deferred,
    Loading,
    /// Dropped because the user is panning or zooming
    Skipped,
    NoData,
    Rendered(RenderGeneration),
    /// Layer construction failed; see `last_error`
    Failed,
}

/// One input tuple for the controller
#[derive(Debug, Clone, PartialEq)]
pub struct MapUpdate {
    pub points: Vec<AccidentPoint>,
    pub is_loading: bool,
    pub mode: RenderMode,
    pub context: FilterContext,
}

impl MapUpdate {
    pub fn new(points: Vec<AccidentPoint>, mode: RenderMode, context: FilterContext) -> Self {
        Self {
            points,
            is_loading: false,
            mode,
            context,
        }
    }

    /// A fetch is in flight for `context`
    pub fn loading(mode: RenderMode, context: FilterContext) -> Self {
        Self {
            points: Vec::new(),
            is_loading: true,
            mode,
            context,
        }
    }
}

/// Emitted after every completed render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderEvent {
    pub generation: RenderGeneration,
    pub mode: RenderMode,
    pub point_count: usize,
}

type RenderCallback = Box<dyn FnMut(&RenderEvent) + Send>;

#[derive(Debug, Default)]
struct InitProgress {
    attempts: u32,
    next_attempt: Option<Instant>,
    failure: Option<String>,
}

pub struct MapViewController<S: MapSurface> {
    surface: S,
    config: MapViewConfig,
    clock: Arc<dyn Clock>,
    renderer: LayerRenderer,
    view_state: ViewStateManager,
    gate: InteractionGate,
    generation: RenderGeneration,
    status: MapStatus,
    last_error: Option<String>,
    visible_points: usize,
    init: InitProgress,
    stashed: Option<MapUpdate>,
    callbacks: Vec<RenderCallback>,
    subscribers: Vec<Sender<RenderEvent>>,
}

impl<S: MapSurface> MapViewController<S> {
    pub fn new(surface: S, config: MapViewConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let renderer = LayerRenderer::new(&config)?;
        let gate = InteractionGate::new(clock.clone(), config.interaction.settle_delay())?;
        let view_state = ViewStateManager::new(config.view.clone());

        Ok(Self {
            surface,
            config,
            clock,
            renderer,
            view_state,
            gate,
            generation: RenderGeneration::INITIAL,
            status: MapStatus::Uninitialized,
            last_error: None,
            visible_points: 0,
            init: InitProgress::default(),
            stashed: None,
            callbacks: Vec::new(),
            subscribers: Vec::new(),
        })
    }

    // --- lifecycle ---------------------------------------------------------------------------

    /// Tries to attach the surface.
    ///
    /// While the widget reports `WidgetUnavailable` this returns the backoff
    /// to wait before calling again. Once `max_retries` retries have failed it
    /// returns the error and the status becomes `Failed`. An update received
    /// before attach is applied as soon as the surface is ready.
    pub fn init(&mut self) -> Result<InitStatus> {
        if self.surface.is_attached() {
            return Ok(InitStatus::Attached);
        }
        if let Some(reason) = &self.init.failure {
            return Err(MapError::WidgetUnavailable {
                attempts: self.init.attempts,
                reason: reason.clone(),
            });
        }

        let now = self.clock.now();
        if let Some(next) = self.init.next_attempt {
            if now < next {
                return Ok(InitStatus::RetryAfter(next.saturating_duration_since(now)));
            }
        }

        self.init.attempts += 1;
        match self.surface.attach() {
            Ok(()) => {
                log::info!("map surface attached after {} attempt(s)", self.init.attempts);
                self.init.next_attempt = None;
                self.surface.set_view(self.view_state.default_view());
                if let Some(update) = self.stashed.take() {
                    self.apply(update);
                }
                Ok(InitStatus::Attached)
            }
            Err(MapError::WidgetUnavailable { reason, .. }) => {
                let retries = self.init.attempts - 1;
                if retries >= self.config.retry.max_retries {
                    log::error!(
                        "map widget unavailable after {} attempt(s): {reason}",
                        self.init.attempts
                    );
                    self.fail(reason.clone());
                    self.init.failure = Some(reason.clone());
                    return Err(MapError::WidgetUnavailable {
                        attempts: self.init.attempts,
                        reason,
                    });
                }

                let delay = self.config.retry.delay_for_attempt(self.init.attempts);
                log::warn!(
                    "map widget unavailable ({reason}); retry {}/{} in {delay:?}",
                    retries + 1,
                    self.config.retry.max_retries
                );
                self.init.next_attempt = Some(now + delay);
                Ok(InitStatus::RetryAfter(delay))
            }
            Err(e) => {
                log::error!("map surface failed to attach: {e}");
                self.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Whether the surface is attached; `Err` once init has given up
    pub fn poll_init(&mut self) -> Result<bool> {
        Ok(matches!(self.init()?, InitStatus::Attached))
    }

    /// Removes every layer and releases the surface. `init` may be called again afterwards.
    pub fn dispose(&mut self) {
        self.renderer.teardown(&mut self.surface);
        self.surface.detach();
        self.view_state.reset();
        self.gate.reset();
        self.init = InitProgress::default();
        self.stashed = None;
        self.visible_points = 0;
        self.status = MapStatus::Uninitialized;
        log::debug!("map view disposed at {}", self.generation);
    }

    /// Disposes the controller and hands the surface back
    pub fn into_surface(mut self) -> S {
        self.dispose();
        self.surface
    }

    // --- input -------------------------------------------------------------------------------

    /// Applies a host gesture to the camera and the interaction gate
    pub fn handle_input(&mut self, event: &InputEvent) {
        self.gate.handle_event(event);
        match *event {
            InputEvent::Drag { delta } => self.surface.pan_by(delta),
            InputEvent::Scroll { delta, position } => self.surface.zoom_by(delta, Some(position)),
            InputEvent::Zoom { delta, focus } => self.surface.zoom_by(delta, focus),
            InputEvent::Resize { size } => self.surface.resize(size),
            _ => {}
        }
    }

    pub fn on_interaction_start(&mut self) {
        self.gate.on_interaction_start();
    }

    pub fn on_interaction_end(&mut self) {
        self.gate.on_interaction_end();
    }

    // --- updates -----------------------------------------------------------------------------

    /// Runs one update through the pipeline.
    ///
    /// Loading tears the layer down. While the user is interacting the update
    /// is dropped. Otherwise the points are validated, the layer for `mode` is
    /// rebuilt, and the camera is either fitted (first load of `context`) or
    /// restored to where the user left it.
    pub fn update(
        &mut self,
        points: &[AccidentPoint],
        is_loading: bool,
        mode: RenderMode,
        context: &FilterContext,
    ) -> UpdateOutcome {
        if !self.surface.is_attached() {
            log::debug!("surface not attached; holding {} point(s)", points.len());
            self.stashed = Some(MapUpdate {
                points: points.to_vec(),
                is_loading,
                mode,
                context: context.clone(),
            });
            return UpdateOutcome::Deferred;
        }

        if is_loading {
            self.renderer.teardown(&mut self.surface);
            self.visible_points = 0;
            self.status = MapStatus::Loading;
            return UpdateOutcome::Loading;
        }

        if self.gate.is_blocking() {
            log::debug!("dropping {mode} update of {} point(s) mid-interaction", points.len());
            return UpdateOutcome::Skipped;
        }

        let valid = CoordinateValidator::validate_refs(points);
        if valid.is_empty() {
            self.renderer.teardown(&mut self.surface);
            self.visible_points = 0;
            self.status = MapStatus::NoData;
            return UpdateOutcome::NoData;
        }

        let first_load = self.view_state.is_first_load(context);
        let captured = if first_load {
            None
        } else {
            Some(self.view_state.capture_current(&self.surface))
        };

        let generation = self.generation.next();
        if let Err(e) = self
            .renderer
            .set_mode(&mut self.surface, mode, &valid, generation)
        {
            self.visible_points = 0;
            self.fail(e.to_string());
            return UpdateOutcome::Failed;
        }

        if first_load {
            let fitted = self.view_state.fit_to_points(
                &mut self.surface,
                &valid,
                context,
                &self.gate.state(),
                self.clock.now(),
            );
            if let Err(e) = fitted {
                log::warn!("could not fit {} point(s): {e}", valid.len());
            }
            self.view_state.mark_loaded(context);
        } else if let Some(state) = captured {
            self.view_state.restore_to(&mut self.surface, state);
        }

        self.generation = generation;
        self.visible_points = valid.len();
        self.last_error = None;
        self.status = MapStatus::Ready {
            generation,
            point_count: valid.len(),
        };
        self.emit(RenderEvent {
            generation,
            mode,
            point_count: valid.len(),
        });

        UpdateOutcome::Rendered(generation)
    }

    pub fn apply(&mut self, update: MapUpdate) -> UpdateOutcome {
        self.update(&update.points, update.is_loading, update.mode, &update.context)
    }

    fn fail(&mut self, reason: String) {
        self.last_error = Some(reason.clone());
        self.status = MapStatus::Failed { reason };
    }

    // --- listeners ---------------------------------------------------------------------------

    /// Calls `callback` after every completed render pass
    pub fn on_render<F>(&mut self, callback: F)
    where
        F: FnMut(&RenderEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Channel of render events; dropped receivers are pruned
    pub fn subscribe(&mut self) -> Receiver<RenderEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: RenderEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    // --- accessors ---------------------------------------------------------------------------

    pub fn status(&self) -> &MapStatus {
        &self.status
    }

    pub fn generation(&self) -> RenderGeneration {
        self.generation
    }

    /// `generation` is the latest completed render pass
    pub fn is_current(&self, generation: RenderGeneration) -> bool {
        generation == self.generation
    }

    pub fn visible_point_count(&self) -> usize {
        self.visible_points
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn renderer_state(&self) -> RendererState {
        self.renderer.state()
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.gate.state()
    }

    pub fn is_blocking(&self) -> bool {
        self.gate.is_blocking()
    }

    pub fn view(&self) -> MapViewState {
        self.surface.view()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_attached()
    }

    pub fn init_attempts(&self) -> u32 {
        self.init.attempts
    }

    pub fn has_pending_update(&self) -> bool {
        self.stashed.is_some()
    }

    pub fn config(&self) -> &MapViewConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// For hosts that paint the layers; layers must not be added or removed through it
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

/// Thread-safe handle that serializes updates to one controller.
///
/// A caller that finds the controller busy leaves its update in a pending
/// slot and returns; the busy holder applies the newest pending update
/// before it lets go. Older pending updates are overwritten.
pub struct SharedMapView<S: MapSurface> {
    inner: Arc<Mutex<MapViewController<S>>>,
    pending: Arc<Mutex<Option<MapUpdate>>>,
}

impl<S: MapSurface> Clone for SharedMapView<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            pending: Arc::clone(&self.pending),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: MapSurface> SharedMapView<S> {
    pub fn new(controller: MapViewController<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Queues `update` and applies it now unless another caller is mid-update.
    ///
    /// Returns the outcome of the last update this call applied, or `None`
    /// when the current holder will apply it instead.
    pub fn submit(&self, update: MapUpdate) -> Option<UpdateOutcome> {
        *lock(&self.pending) = Some(update);

        let mut outcome = None;
        loop {
            let mut controller = match self.inner.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return outcome,
            };

            loop {
                let next = lock(&self.pending).take();
                match next {
                    Some(update) => outcome = Some(controller.apply(update)),
                    None => break,
                }
            }
            drop(controller);

            // An update may have landed between the last drain and the unlock
            if lock(&self.pending).is_none() {
                return outcome;
            }
        }
    }

    /// Runs `f` with exclusive access, waiting for any update in progress
    pub fn with<R>(&self, f: impl FnOnce(&mut MapViewController<S>) -> R) -> R {
        let mut controller = lock(&self.inner);
        f(&mut *controller)
    }

    pub fn init(&self) -> Result<InitStatus> {
        self.with(|controller| controller.init())
    }

    pub fn handle_input(&self, event: &InputEvent) {
        self.with(|controller| controller.handle_input(event));
    }

    pub fn status(&self) -> MapStatus {
        self.with(|controller| controller.status().clone())
    }

    pub fn generation(&self) -> RenderGeneration {
        self.with(|controller| controller.generation())
    }
}

use crate::core::{clock::Clock, constants::MIN_SETTLE_DELAY_MS};
use crate::input::events::{GesturePhase, InputEvent};
use crate::{MapError, Result};
use instant::Instant;
use std::sync::Arc;
use std::time::Duration;

/// Snapshot of the user's pan/zoom activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionState {
    /// A gesture is in progress or its settle window has not elapsed
    pub is_interacting: bool,
    /// When the current settle window closes
    pub settle_deadline: Option<Instant>,
}

impl InteractionState {
    /// A state that never blocks
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_blocking_at(&self, now: Instant) -> bool {
        self.is_interacting || self.settle_deadline.map_or(false, |deadline| now < deadline)
    }
}

/// Holds data-driven re-renders back while the user pans or zooms.
///
/// The gate blocks from the first gesture start until `settle_delay` after
/// the last gesture end. Overlapping gestures (a pinch during a drag) are
/// counted, so the window only opens once all of them have ended.
pub struct InteractionGate {
    clock: Arc<dyn Clock>,
    settle_delay: Duration,
    active: u32,
    settle_deadline: Option<Instant>,
}

impl InteractionGate {
    pub fn new(clock: Arc<dyn Clock>, settle_delay: Duration) -> Result<Self> {
        if settle_delay < Duration::from_millis(MIN_SETTLE_DELAY_MS) {
            return Err(MapError::Config(format!(
                "settle delay must be at least {MIN_SETTLE_DELAY_MS} ms, got {} ms",
                settle_delay.as_millis()
            )));
        }
        Ok(Self {
            clock,
            settle_delay,
            active: 0,
            settle_deadline: None,
        })
    }

    pub fn on_interaction_start(&mut self) {
        self.active = self.active.saturating_add(1);
        self.settle_deadline = None;
    }

    pub fn on_interaction_end(&mut self) {
        if self.active == 0 {
            log::debug!("interaction end without a matching start");
        }
        self.active = self.active.saturating_sub(1);
        if self.active == 0 {
            self.settle_deadline = Some(self.clock.now() + self.settle_delay);
        }
    }

    /// Feeds a host gesture through the gate
    pub fn handle_event(&mut self, event: &InputEvent) -> GesturePhase {
        let phase = event.phase();
        match phase {
            GesturePhase::Start => self.on_interaction_start(),
            GesturePhase::End => self.on_interaction_end(),
            GesturePhase::Discrete => {
                self.on_interaction_start();
                self.on_interaction_end();
            }
            GesturePhase::Update | GesturePhase::Passive => {}
        }
        phase
    }

    pub fn is_blocking(&self) -> bool {
        self.state().is_blocking_at(self.clock.now())
    }

    pub fn state(&self) -> InteractionState {
        let now = self.clock.now();
        let settle_deadline = self.settle_deadline.filter(|deadline| now < *deadline);
        InteractionState {
            is_interacting: self.active > 0 || settle_deadline.is_some(),
            settle_deadline,
        }
    }

    /// End of the pending settle window, if one is still open
    pub fn settle_deadline(&self) -> Option<Instant> {
        self.state().settle_deadline
    }

    /// Time left until the gate opens; zero when it is already open, `None` mid-gesture
    pub fn remaining(&self) -> Option<Duration> {
        if self.active > 0 {
            return None;
        }
        let now = self.clock.now();
        Some(
            self.settle_deadline
                .map_or(Duration::ZERO, |deadline| deadline.saturating_duration_since(now)),
        )
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Forgets any gesture in flight
    pub fn reset(&mut self) {
        self.active = 0;
        self.settle_deadline = None;
    }
}

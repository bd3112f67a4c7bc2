//! Tokio helpers for hosts that run the controller inside an async runtime
//!
//! The controller itself never spawns or sleeps; it reports deadlines through
//! its clock. These helpers turn those deadlines into timers.

use crate::core::controller::{InitStatus, SharedMapView};
use crate::surface::MapSurface;
use crate::Result;
use std::time::Duration;
use tokio::task::JoinHandle;

/// One-shot timer that fires a callback after the settle window.
///
/// Scheduling again cancels the pending callback, so a burst of gestures
/// produces a single call once the user stops.
#[derive(Debug)]
pub struct SettleTimer {
    delay: Duration,
    handle: Option<JoinHandle<()>>,
}

impl SettleTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: None,
        }
    }

    /// Must be called from inside a Tokio runtime
    pub fn schedule<F>(&mut self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for SettleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Drives `SharedMapView::init` until the surface attaches, sleeping through
/// each backoff. Returns the `WidgetUnavailable` error once retries run out.
pub async fn init_with_retry<S: MapSurface>(view: &SharedMapView<S>) -> Result<()> {
    loop {
        match view.init()? {
            InitStatus::Attached => return Ok(()),
            InitStatus::RetryAfter(delay) => {
                log::debug!("waiting {delay:?} for the map container");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

//! # crashmap
//!
//! Map view orchestration for road-accident data.
//!
//! The crate drives a single interactive map surface that shows a batch of
//! accident points either as a weighted heat layer or as severity-styled
//! marker clusters. It keeps the user's center/zoom across data refreshes,
//! re-fits the view when the filter context changes, and holds data-driven
//! re-renders back while the user is panning or zooming.

pub mod core;
pub mod data;
pub mod input;
pub mod layers;
pub mod prelude;
#[cfg(feature = "tokio-runtime")]
pub mod runtime;
pub mod spatial;
pub mod surface;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    clock::{Clock, ManualClock, SystemClock},
    config::{MapViewConfig, MapViewProfile},
    controller::{
        InitStatus, MapStatus, MapUpdate, MapViewController, RenderEvent, SharedMapView,
        UpdateOutcome,
    },
    geo::{LatLng, LatLngBounds, Point},
    view_state::{MapViewState, ViewStateManager},
    viewport::Viewport,
};

pub use data::{
    filter::FilterContext, intensity::IntensityModel, point::AccidentPoint,
    validation::CoordinateValidator,
};

pub use input::{
    events::InputEvent,
    gate::{InteractionGate, InteractionState},
};

pub use layers::{
    base::{LayerId, MapLayer, RenderGeneration, RenderMode},
    renderer::{LayerRenderer, RendererState},
};

pub use surface::{headless::HeadlessSurface, MapSurface};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Map widget unavailable after {attempts} attempt(s): {reason}")]
    WidgetUnavailable { attempts: u32, reason: String },

    #[error("Failed to build {mode} layer from {point_count} point(s): {reason}")]
    LayerConstruction {
        mode: RenderMode,
        point_count: usize,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Map surface is not initialized")]
    NotInitialized,
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` as the `log` backend, honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

//! Prelude module for common crashmap types and traits
//!
//! `use crashmap::prelude::*;` brings in the controller, the surface trait
//! and the data types a host needs to feed it.

pub use crate::core::{
    clock::{Clock, ManualClock, SystemClock},
    config::{
        InteractionConfig, MapViewConfig, MapViewProfile, RetryConfig, ViewConfig,
    },
    controller::{
        InitStatus, MapStatus, MapUpdate, MapViewController, RenderEvent, SharedMapView,
        UpdateOutcome,
    },
    geo::{LatLng, LatLngBounds, Point},
    view_state::{MapViewState, ViewStateManager},
    viewport::Viewport,
};

pub use crate::data::{
    filter::FilterContext,
    intensity::{IntensityConfig, IntensityModel},
    point::{AccidentDetails, AccidentPoint},
    validation::CoordinateValidator,
};

pub use crate::input::{
    events::{GesturePhase, InputEvent},
    gate::{InteractionGate, InteractionState},
};

pub use crate::layers::{
    base::{LayerId, LayerType, MapLayer, RenderGeneration, RenderMode},
    cluster::{ClusterLayer, ClusterMarker, ClusterView},
    heatmap::{HeatLayer, HeatmapConfig},
    renderer::{LayerRenderer, RendererState},
};

pub use crate::spatial::clustering::{Cluster, ClusteringConfig};

pub use crate::surface::{headless::HeadlessSurface, MapSurface};

pub use crate::ui::{
    popup::PopupContent,
    style::{ClusterPalette, MapStyle, MarkerSeverity},
};

#[cfg(feature = "egui")]
pub use crate::ui::egui_surface::EguiSurface;

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::{init_with_retry, SettleTimer};

pub use crate::{Error as MapError, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

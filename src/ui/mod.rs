pub mod popup;
pub mod style;

#[cfg(feature = "egui")]
pub mod egui_surface;

pub use popup::{PopupContent, PopupRow};
pub use style::{ClusterPalette, ClusterStyle, ClusterTier, Color, MapStyle, MarkerSeverity};

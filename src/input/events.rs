use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Host-agnostic gestures forwarded from the map widget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Single click/tap
    Click { position: Point },
    /// Start of drag operation
    DragStart { position: Point },
    /// Drag in progress; `delta` is the pointer movement in pixels
    Drag { delta: Point },
    /// End of drag operation
    DragEnd,
    /// Start of an animated or pinch zoom
    ZoomStart,
    /// Zoom step inside a `ZoomStart`/`ZoomEnd` pair
    Zoom { delta: f64, focus: Option<Point> },
    /// End of an animated or pinch zoom
    ZoomEnd,
    /// One scroll wheel notch; a complete zoom gesture on its own
    Scroll { delta: f64, position: Point },
    /// Viewport/window resize
    Resize { size: Point },
}

/// Where an event sits in a pan/zoom gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    Start,
    Update,
    End,
    /// Starts and ends in the same event
    Discrete,
    /// Not part of a pan/zoom gesture
    Passive,
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::Click { position }
            | InputEvent::DragStart { position }
            | InputEvent::Scroll { position, .. } => Some(*position),
            InputEvent::Zoom { focus, .. } => *focus,
            _ => None,
        }
    }

    /// Checks if this is a mouse/pointer event
    pub fn is_pointer_event(&self) -> bool {
        matches!(
            self,
            InputEvent::Click { .. }
                | InputEvent::DragStart { .. }
                | InputEvent::Drag { .. }
                | InputEvent::DragEnd
                | InputEvent::Scroll { .. }
        )
    }

    pub fn phase(&self) -> GesturePhase {
        match self {
            InputEvent::DragStart { .. } | InputEvent::ZoomStart => GesturePhase::Start,
            InputEvent::Drag { .. } | InputEvent::Zoom { .. } => GesturePhase::Update,
            InputEvent::DragEnd | InputEvent::ZoomEnd => GesturePhase::End,
            InputEvent::Scroll { .. } => GesturePhase::Discrete,
            InputEvent::Click { .. } | InputEvent::Resize { .. } => GesturePhase::Passive,
        }
    }
}

pub mod events;
pub mod gate;

pub use events::{GesturePhase, InputEvent};
pub use gate::{InteractionGate, InteractionState};

//! Camera control state.
//!
//! Device polling lives outside the engine; whatever owns the window maps
//! raw key events onto [`CameraControl`] values and maintains an
//! [`InputState`]. The camera only ever asks "is this control held".

pub mod state;

pub use state::{CameraControl, InputState};

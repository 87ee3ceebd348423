//! Rendering systems for the prism engine.
//!
//! One frame runs update then render in strict sequence on a single thread:
//! input state feeds the camera, the camera rebuilds its frustum, the render
//! system filters entities through it and issues draws, and the text and
//! bitmap passes draw screen-space quads on top with depth testing off.
//!
//! # Invariants
//! - The frustum is rebuilt inside every camera update; culling never sees a
//!   stale frustum.
//! - A recoverable error aborts the frame, not the engine; only device loss
//!   is fatal.

pub mod bitmap;
pub mod camera;
pub mod error;
pub mod frustum;
pub mod screen;
pub mod stage;
pub mod system;
pub mod technique;
pub mod text;

pub use bitmap::Bitmap;
pub use camera::{Camera, Lens};
pub use error::{FrameError, RenderError, TextError};
pub use frustum::Frustum;
pub use stage::Stage;
pub use system::RenderSystem;
pub use technique::{
    DefaultTechnique, FontTechnique, ShaderResources, ShaderTechnique, TechniqueSet,
};
pub use text::{FontProvider, TextSystem};

use prism_device::DeviceError;
use prism_ecs::ShaderKind;

/// Errors from the scene, text, and bitmap render paths.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("device operation failed")]
    Device(#[from] DeviceError),
    #[error("no technique registered for {0:?}")]
    MissingTechnique(ShaderKind),
    #[error("text update failed")]
    Text(#[from] TextError),
}

impl RenderError {
    pub fn is_fatal(&self) -> bool {
        match self {
            RenderError::Device(err) => err.is_fatal(),
            RenderError::Text(err) => err.is_fatal(),
            RenderError::MissingTechnique(_) => false,
        }
    }
}

/// Errors from the text system.
///
/// `UpdateFailed` means the content diff could not be realised; the
/// component's previous text is untouched, every resource allocated during
/// the attempt has been released, and the next frame retries the same diff.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error(
        "a problem occurred updating the text {attempted:?}; the previous frame displayed \
         {last_good:?}"
    )]
    UpdateFailed {
        attempted: String,
        last_good: String,
        #[source]
        source: DeviceError,
    },
    #[error("glyph quad update failed")]
    Device(#[from] DeviceError),
}

impl TextError {
    pub fn is_fatal(&self) -> bool {
        match self {
            TextError::UpdateFailed { source, .. } => source.is_fatal(),
            TextError::Device(err) => err.is_fatal(),
        }
    }
}

/// The single signal the frame driver emits: either this frame failed and
/// the engine should continue, or the device is gone and it should not.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame failed to render")]
    RenderFailed(#[source] RenderError),
    #[error("the graphics device was lost")]
    DeviceLost,
}

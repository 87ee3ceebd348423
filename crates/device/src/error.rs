/// Errors surfaced by a [`crate::Device`].
///
/// `ResourceCreation` is fatal to the owning object's initialisation.
/// `MapFailed` aborts the single update that attempted the write; the
/// buffer's prior contents remain intact. `DeviceLost` is the only variant
/// the frame driver treats as unrecoverable.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to create {what}")]
    ResourceCreation { what: String },
    #[error("failed to map {what} to the CPU")]
    MapFailed { what: String },
    #[error("invalid handle: {what}")]
    InvalidHandle { what: String },
    #[error("the graphics device was lost")]
    DeviceLost,
}

impl DeviceError {
    /// Whether the error is unrecoverable for the whole engine rather than
    /// just the operation that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeviceError::DeviceLost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_device_loss_is_fatal() {
        assert!(DeviceError::DeviceLost.is_fatal());
        assert!(!DeviceError::MapFailed {
            what: "vertex buffer".into()
        }
        .is_fatal());
        assert!(!DeviceError::ResourceCreation {
            what: "texture".into()
        }
        .is_fatal());
    }
}

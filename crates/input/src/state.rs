use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The discrete directional controls the camera responds to. Held controls
/// contribute fixed velocity deltas each frame; there is no analog axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CameraControl {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    LookLeft,
    LookRight,
    LookUp,
    LookDown,
}

/// The set of controls currently held down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    held: BTreeSet<CameraControl>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, control: CameraControl) {
        self.held.insert(control);
    }

    pub fn release(&mut self, control: CameraControl) {
        self.held.remove(&control);
    }

    pub fn is_held(&self, control: CameraControl) -> bool {
        self.held.contains(&control)
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = InputState::new();
        assert!(!input.is_held(CameraControl::MoveLeft));

        input.press(CameraControl::MoveLeft);
        assert!(input.is_held(CameraControl::MoveLeft));

        input.release(CameraControl::MoveLeft);
        assert!(!input.is_held(CameraControl::MoveLeft));
    }

    #[test]
    fn pressing_twice_is_idempotent() {
        let mut input = InputState::new();
        input.press(CameraControl::LookUp);
        input.press(CameraControl::LookUp);
        input.release(CameraControl::LookUp);
        assert!(!input.is_held(CameraControl::LookUp));
    }

    #[test]
    fn clear_releases_everything() {
        let mut input = InputState::new();
        input.press(CameraControl::MoveUp);
        input.press(CameraControl::LookDown);
        input.clear();
        assert!(!input.is_held(CameraControl::MoveUp));
        assert!(!input.is_held(CameraControl::LookDown));
    }
}

use glam::{Mat4, Vec3};
use prism_common::Transform;
use prism_input::{CameraControl, InputState};

use crate::frustum::Frustum;

/// Units per second for held movement controls.
const MOVE_SPEED: f32 = 1.5;
/// Radians per second for held look controls.
const LOOK_SPEED: f32 = 3.0;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Lens {
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }
}

/// The scene camera: a transform driven by discrete controls, the view
/// matrix derived from it, and the frustum derived from the view.
///
/// `update` rebuilds view and frustum in the same call, so culling never
/// runs against a frustum older than the current transform.
#[derive(Debug, Clone)]
pub struct Camera {
    transform: Transform,
    lens: Lens,
    view: Mat4,
    frustum: Frustum,
}

impl Camera {
    pub fn new(transform: Transform, lens: Lens) -> Self {
        let view = Self::view_for(&transform);
        let frustum = Frustum::from_view_projection(view, lens.projection());
        Self {
            transform,
            lens,
            view,
            frustum,
        }
    }

    /// Camera at `position` with default lens, facing -Z.
    pub fn at(position: Vec3) -> Self {
        Self::new(Transform::at(position), Lens::default())
    }

    /// Advance one frame: re-derive velocities from held controls, integrate
    /// the transform, then rebuild view matrix and frustum.
    pub fn update(&mut self, input: &InputState, delta: f32) {
        self.transform.velocity = Vec3::ZERO;
        self.transform.angular_velocity = Vec3::ZERO;

        if input.is_held(CameraControl::MoveLeft) {
            self.transform.velocity.x -= MOVE_SPEED;
        } else if input.is_held(CameraControl::MoveRight) {
            self.transform.velocity.x += MOVE_SPEED;
        }
        if input.is_held(CameraControl::MoveUp) {
            self.transform.velocity.y += MOVE_SPEED;
        } else if input.is_held(CameraControl::MoveDown) {
            self.transform.velocity.y -= MOVE_SPEED;
        }

        if input.is_held(CameraControl::LookLeft) {
            self.transform.angular_velocity.y += LOOK_SPEED;
        } else if input.is_held(CameraControl::LookRight) {
            self.transform.angular_velocity.y -= LOOK_SPEED;
        }
        if input.is_held(CameraControl::LookUp) {
            self.transform.angular_velocity.x += LOOK_SPEED;
        } else if input.is_held(CameraControl::LookDown) {
            self.transform.angular_velocity.x -= LOOK_SPEED;
        }

        self.transform.advance(delta);
        self.rebuild();
    }

    fn view_for(transform: &Transform) -> Mat4 {
        let rotation = transform.rotation_quat();
        let forward = rotation * Vec3::NEG_Z;
        let up = rotation * Vec3::Y;
        Mat4::look_at_rh(transform.position, transform.position + forward, up)
    }

    fn rebuild(&mut self) {
        self.view = Self::view_for(&self.transform);
        self.frustum = Frustum::from_view_projection(self.view, self.lens.projection());
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.lens.projection()
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Place or orient the camera directly; the next `update` (or an
    /// explicit [`Camera::refresh`]) re-derives view and frustum.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Rebuild view and frustum without advancing the transform.
    pub fn refresh(&mut self) {
        self.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn default_lens_projects_without_nan() {
        let camera = Camera::at(Vec3::new(0.0, 0.0, 5.0));
        let vp = camera.projection() * camera.view();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn held_control_moves_the_camera() {
        let mut camera = Camera::at(Vec3::ZERO);
        let mut input = InputState::new();
        input.press(CameraControl::MoveRight);
        camera.update(&input, 1.0);
        assert!((camera.position().x - MOVE_SPEED).abs() < 1e-6);
    }

    #[test]
    fn velocity_is_rederived_each_frame() {
        let mut camera = Camera::at(Vec3::ZERO);
        let mut input = InputState::new();
        input.press(CameraControl::MoveUp);
        camera.update(&input, 1.0);
        let after_press = camera.position();

        input.release(CameraControl::MoveUp);
        camera.update(&input, 1.0);
        assert_eq!(camera.position(), after_press);
    }

    #[test]
    fn opposed_controls_prefer_the_first() {
        // Matching the discrete-control else-if ladder: left wins over right.
        let mut camera = Camera::at(Vec3::ZERO);
        let mut input = InputState::new();
        input.press(CameraControl::MoveLeft);
        input.press(CameraControl::MoveRight);
        camera.update(&input, 1.0);
        assert!(camera.position().x < 0.0);
    }

    #[test]
    fn frustum_is_fresh_after_every_update() {
        let mut camera = Camera::at(Vec3::new(0.0, 0.0, 5.0));
        let input = InputState::new();
        camera.update(&input, 0.016);
        assert!(camera.frustum().contains_point(Vec3::ZERO, 0.0));

        // Turn around: the origin leaves the frustum in the same update.
        camera.transform_mut().rotation.y = PI;
        camera.refresh();
        assert!(!camera.frustum().contains_point(Vec3::ZERO, 0.0));
        assert!(camera
            .frustum()
            .contains_point(Vec3::new(0.0, 0.0, 10.0), 0.0));
    }

    #[test]
    fn look_controls_rotate_the_view() {
        let mut camera = Camera::at(Vec3::ZERO);
        let before = camera.view();
        let mut input = InputState::new();
        input.press(CameraControl::LookLeft);
        camera.update(&input, 0.1);
        assert_ne!(camera.view(), before);
    }
}

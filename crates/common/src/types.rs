use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Spatial transform with per-frame velocities.
///
/// Rotation is Euler angles in radians (pitch about x, yaw about y, roll
/// about z). Velocities are reset and re-derived from input each frame by
/// whoever drives the transform; `advance` only integrates them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Integrate velocities over `delta` seconds.
    ///
    /// Rotation components wrap into `[0, 2π)` so angles never grow without
    /// bound across long sessions.
    pub fn advance(&mut self, delta: f32) {
        self.rotation += self.angular_velocity * delta;
        self.rotation.x = wrap_angle(self.rotation.x);
        self.rotation.y = wrap_angle(self.rotation.y);
        self.rotation.z = wrap_angle(self.rotation.z);
        self.position += self.velocity * delta;
    }

    /// Rotation as a quaternion (yaw, then pitch, then roll).
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        )
    }

    /// World matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.position)
    }
}

fn wrap_angle(angle: f32) -> f32 {
    angle.rem_euclid(std::f32::consts::TAU)
}

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Screen dimensions in pixels. Screen-space quads are laid out relative to
/// the top-left corner of a surface this size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f32,
    pub height: f32,
}

impl ScreenSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Directional light parameters shared by the lit shader techniques.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub direction: Vec3,
    pub specular_power: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            ambient: Color::new(0.15, 0.15, 0.15, 1.0),
            diffuse: Color::WHITE,
            specular: Color::WHITE,
            direction: Vec3::new(0.8, -1.0, 0.2),
            specular_power: 32.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn entity_id_uniqueness() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn advance_integrates_velocity() {
        let mut t = Transform::default();
        t.velocity = Vec3::new(2.0, 0.0, -1.0);
        t.advance(0.5);
        assert_eq!(t.position, Vec3::new(1.0, 0.0, -0.5));
    }

    #[test]
    fn advance_wraps_rotation() {
        let mut t = Transform::default();
        t.rotation = Vec3::new(0.0, TAU - 0.1, 0.0);
        t.angular_velocity = Vec3::new(0.0, 0.2, 0.0);
        t.advance(1.0);
        assert!((t.rotation.y - 0.1).abs() < 1e-5);

        t.angular_velocity = Vec3::new(-PI, 0.0, 0.0);
        t.advance(1.0);
        assert!(t.rotation.x >= 0.0 && t.rotation.x < TAU);
    }

    #[test]
    fn rotation_quat_yaw_turns_forward() {
        let mut t = Transform::default();
        t.rotation.y = PI;
        let fwd = t.rotation_quat() * Vec3::NEG_Z;
        assert!((fwd - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn screen_aspect() {
        let s = ScreenSize::new(1920.0, 1080.0);
        assert!((s.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}

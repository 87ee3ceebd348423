//! Six-plane view frustum and its visibility tests.
//!
//! Planes are extracted from the view-projection matrix rows
//! (Gribb/Hartmann), with one adjustment: the near plane is anchored at the
//! camera position along the view direction, so a point exactly at the eye
//! always tests inside. That keeps the cull strictly conservative: geometry
//! between the eye and the near clip distance is drawn rather than dropped.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

/// Plane index aliases for readability in tests.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// The visible region of space as six inward-facing half-space planes,
/// stored as `(normal, d)` with `dot(normal, p) + d >= 0` meaning inside.
///
/// Recomputed from the camera every frame; all tests are pure reads, safe to
/// call concurrently for independent entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the frustum from a view matrix and a projection matrix with
    /// 0..1 clip depth.
    pub fn from_view_projection(view: Mat4, projection: Mat4) -> Self {
        let vp = projection * view;
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        // The view matrix's z row is the back vector and its distance from
        // the eye; negated it is a plane through the eye facing forward.
        planes[NEAR] = -view.row(2);
        planes[FAR] = rows[3] - rows[2];

        for plane in &mut planes {
            let length = plane.xyz().length();
            if length > 0.0 {
                *plane /= length;
            }
        }
        Self { planes }
    }

    /// Point test with an adjustable slack radius. Radius 0 is the exact
    /// point test; a positive radius is the sphere test.
    pub fn contains_point(&self, point: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.xyz().dot(point) + plane.w >= -radius)
    }

    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.contains_point(center, radius)
    }

    /// Axis-aligned box test. Inside unless the box is entirely on the outer
    /// side of some plane; the check uses the box corner furthest along each
    /// plane normal, so straddling boxes count as inside.
    pub fn contains_box(&self, center: Vec3, half_extents: Vec3) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.xyz();
            let reach = normal.abs().dot(half_extents);
            normal.dot(center) + plane.w + reach >= 0.0
        })
    }

    /// Uniform half-extent box test.
    pub fn contains_cube(&self, center: Vec3, half_extent: f32) -> bool {
        self.contains_box(center, Vec3::splat(half_extent))
    }
}

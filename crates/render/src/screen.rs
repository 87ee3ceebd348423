//! Shared matrices for the screen-space passes (bitmap and text).
//!
//! Overlay quads live on the z = 0 plane in a coordinate system centered on
//! the screen, viewed by a fixed camera one unit behind it with an
//! orthographic projection sized to the screen.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use prism_common::ScreenSize;
use prism_device::{BufferUsage, Device, DeviceError, Geometry};

/// Fixed look-at view for overlay rendering: eye one unit behind the screen
/// plane, looking at it head-on so x and y are not mirrored.
pub fn overlay_view() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Y)
}

/// Orthographic projection covering the full screen, centered at the origin.
pub fn overlay_projection(screen: ScreenSize) -> Mat4 {
    Mat4::orthographic_rh(
        -screen.width / 2.0,
        screen.width / 2.0,
        -screen.height / 2.0,
        screen.height / 2.0,
        0.1,
        1000.0,
    )
}

/// Screen-space quad corners for a top-left position and a width/height, in
/// the centered overlay coordinate system.
pub fn quad_corners(screen: ScreenSize, x: f32, y: f32, width: f32, height: f32) -> QuadCorners {
    let left = -(screen.width / 2.0) + x;
    let top = screen.height / 2.0 - y;
    QuadCorners {
        left,
        right: left + width,
        top,
        bottom: top - height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadCorners {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Vertex layout shared by the bitmap and glyph quads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
}

pub const QUAD_VERTEX_COUNT: u32 = 6;
pub const QUAD_STRIDE: u32 = std::mem::size_of::<QuadVertex>() as u32;

/// Two clockwise triangles covering the corners, full texture range.
pub fn quad_vertices(corners: QuadCorners) -> [QuadVertex; 6] {
    let QuadCorners {
        left,
        right,
        top,
        bottom,
    } = corners;
    [
        QuadVertex {
            position: [left, top, 0.0],
            texcoord: [0.0, 0.0],
        },
        QuadVertex {
            position: [right, bottom, 0.0],
            texcoord: [1.0, 1.0],
        },
        QuadVertex {
            position: [left, bottom, 0.0],
            texcoord: [0.0, 1.0],
        },
        QuadVertex {
            position: [left, top, 0.0],
            texcoord: [0.0, 0.0],
        },
        QuadVertex {
            position: [right, top, 0.0],
            texcoord: [1.0, 0.0],
        },
        QuadVertex {
            position: [right, bottom, 0.0],
            texcoord: [1.0, 1.0],
        },
    ]
}

/// A dynamic six-vertex quad with zeroed vertices and identity indices.
/// The owner writes real vertices before the first draw.
pub fn blank_quad(device: &mut dyn Device) -> Result<Geometry, DeviceError> {
    let vertices = vec![0u8; (QUAD_VERTEX_COUNT * QUAD_STRIDE) as usize];
    let indices: Vec<u8> = (0..QUAD_VERTEX_COUNT as u16)
        .flat_map(u16::to_le_bytes)
        .collect();
    Geometry::create(
        device,
        &vertices,
        QUAD_STRIDE,
        &indices,
        QUAD_VERTEX_COUNT,
        BufferUsage::Dynamic,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_top_left_origin_to_centered_space() {
        let screen = ScreenSize::new(800.0, 600.0);
        let quad = quad_corners(screen, 0.0, 0.0, 100.0, 50.0);
        assert_eq!(quad.left, -400.0);
        assert_eq!(quad.right, -300.0);
        assert_eq!(quad.top, 300.0);
        assert_eq!(quad.bottom, 250.0);
    }

    #[test]
    fn overlay_quad_projects_on_screen() {
        let screen = ScreenSize::new(800.0, 600.0);
        let vp = overlay_projection(screen) * overlay_view();
        // A point on the screen plane lands inside normalized device space.
        let clip = vp * glam::Vec4::new(100.0, 100.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&ndc.z));
        // Right of center stays right, above center stays up.
        assert!(ndc.x > 0.0 && ndc.y > 0.0);
    }
}

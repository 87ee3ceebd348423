//! Graphics device abstraction.
//!
//! The renderer never talks to a swapchain or a raw GPU API; it drives a
//! [`Device`] through typed handles. Buffer writes follow the
//! map/copy/unmap-discard pattern: `write_*_buffer` replaces the previous
//! contents in full and must complete before the draw that consumes them on
//! the same frame.
//!
//! # Invariants
//! - Handles are created by exactly one factory call and released by exactly
//!   one release call; releasing an already-dead handle is a no-op.
//! - [`Geometry`] owns its vertex and index buffers as a pair: construction
//!   is atomic (both handles or neither) and release is idempotent.

pub mod error;
pub mod geometry;
pub mod trace;

pub use error::DeviceError;
pub use geometry::Geometry;
pub use trace::{TraceDevice, TraceOp};

use serde::{Deserialize, Serialize};

/// Handle to a GPU vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexBufferId(pub u64);

/// Handle to a GPU index buffer (16-bit indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexBufferId(pub u64);

/// Handle to a GPU constant buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstantBufferId(pub u64);

/// Handle to a GPU texture (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

/// How a buffer will be written after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferUsage {
    /// Immutable after upload.
    #[default]
    Static,
    /// CPU-writable via `write_vertex_buffer` (map discard).
    Dynamic,
}

/// Rasterizer face culling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Primitive assembly topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    TriangleList,
}

/// The device contract the rendering systems are written against.
///
/// Single-threaded and frame-synchronous: one caller drives the device per
/// frame, and each buffer has exactly one writing system.
pub trait Device {
    fn create_vertex_buffer(
        &mut self,
        bytes: &[u8],
        usage: BufferUsage,
    ) -> Result<VertexBufferId, DeviceError>;
    fn create_index_buffer(&mut self, bytes: &[u8]) -> Result<IndexBufferId, DeviceError>;
    fn create_constant_buffer(&mut self, size: usize) -> Result<ConstantBufferId, DeviceError>;
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError>;

    /// Replace the full contents of a dynamic vertex buffer (map discard).
    fn write_vertex_buffer(
        &mut self,
        buffer: VertexBufferId,
        bytes: &[u8],
    ) -> Result<(), DeviceError>;
    /// Replace the full contents of a constant buffer (map discard).
    fn write_constant_buffer(
        &mut self,
        buffer: ConstantBufferId,
        bytes: &[u8],
    ) -> Result<(), DeviceError>;

    fn release_vertex_buffer(&mut self, buffer: VertexBufferId);
    fn release_index_buffer(&mut self, buffer: IndexBufferId);
    fn release_constant_buffer(&mut self, buffer: ConstantBufferId);
    fn release_texture(&mut self, texture: TextureId);

    fn set_cull_mode(&mut self, mode: CullMode);
    fn set_depth_enabled(&mut self, enabled: bool);
    fn set_topology(&mut self, topology: Topology);
    fn bind_vertex_buffer(&mut self, buffer: VertexBufferId, stride: u32, offset: u32);
    fn bind_index_buffer(&mut self, buffer: IndexBufferId);
    fn bind_texture(&mut self, slot: u32, texture: TextureId);
    fn bind_constant_buffer(&mut self, slot: u32, buffer: ConstantBufferId);

    /// Issue one indexed draw with the currently bound state.
    fn draw_indexed(&mut self, index_count: u32) -> Result<(), DeviceError>;
}

//! A headless [`Device`] that records every call it receives.
//!
//! Used as the test double for the rendering systems and as a diagnostics
//! backend when no GPU is available. Handles are validated: writing to or
//! binding a released handle is reported instead of silently ignored, which
//! is how the ownership tests catch double-release bugs.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    BufferUsage, ConstantBufferId, CullMode, Device, DeviceError, IndexBufferId, TextureId,
    Topology, VertexBufferId,
};

/// One recorded device call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceOp {
    CreateVertexBuffer(VertexBufferId),
    CreateIndexBuffer(IndexBufferId),
    CreateConstantBuffer(ConstantBufferId),
    CreateTexture(TextureId),
    WriteVertexBuffer(VertexBufferId),
    WriteConstantBuffer(ConstantBufferId),
    ReleaseVertexBuffer(VertexBufferId),
    ReleaseIndexBuffer(IndexBufferId),
    ReleaseConstantBuffer(ConstantBufferId),
    ReleaseTexture(TextureId),
    SetCullMode(CullMode),
    SetDepthEnabled(bool),
    SetTopology(Topology),
    BindVertexBuffer(VertexBufferId),
    BindIndexBuffer(IndexBufferId),
    BindTexture { slot: u32, texture: TextureId },
    BindConstantBuffer { slot: u32, buffer: ConstantBufferId },
    DrawIndexed(u32),
}

/// Recording device. One instance per test or diagnostics session.
#[derive(Debug, Default)]
pub struct TraceDevice {
    next_id: u64,
    vertex_buffers: BTreeMap<u64, BufferUsage>,
    index_buffers: BTreeSet<u64>,
    constant_buffers: BTreeMap<u64, usize>,
    textures: BTreeSet<u64>,
    ops: Vec<TraceOp>,
    cull_mode: CullMode,
    depth_enabled: bool,
    fail_create_in: Option<u32>,
    fail_next_map: bool,
    lost: bool,
}

impl TraceDevice {
    pub fn new() -> Self {
        Self {
            cull_mode: CullMode::Back,
            depth_enabled: true,
            ..Self::default()
        }
    }

    /// Everything recorded so far, in call order.
    pub fn ops(&self) -> &[TraceOp] {
        &self.ops
    }

    /// Forget recorded calls, keep live resources. Lets a test measure one
    /// phase in isolation.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn draw_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, TraceOp::DrawIndexed(_)))
            .count()
    }

    pub fn vertex_write_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, TraceOp::WriteVertexBuffer(_)))
            .count()
    }

    pub fn texture_create_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, TraceOp::CreateTexture(_)))
            .count()
    }

    pub fn texture_release_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, TraceOp::ReleaseTexture(_)))
            .count()
    }

    /// Live buffers and textures of every kind.
    pub fn live_resource_count(&self) -> usize {
        self.vertex_buffers.len()
            + self.index_buffers.len()
            + self.constant_buffers.len()
            + self.textures.len()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    pub fn depth_enabled(&self) -> bool {
        self.depth_enabled
    }

    /// Make the next buffer/texture creation fail.
    pub fn fail_next_create(&mut self) {
        self.fail_create_in = Some(0);
    }

    /// Make creation fail after `n` more successful creations.
    pub fn fail_create_after(&mut self, n: u32) {
        self.fail_create_in = Some(n);
    }

    /// Make the next map (buffer write) fail.
    pub fn fail_next_map(&mut self) {
        self.fail_next_map = true;
    }

    /// Simulate device removal: every subsequent draw fails fatally.
    pub fn mark_lost(&mut self) {
        self.lost = true;
    }

    fn take_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn creation_gate(&mut self, what: &str) -> Result<(), DeviceError> {
        match self.fail_create_in {
            Some(0) => {
                self.fail_create_in = None;
                Err(DeviceError::ResourceCreation { what: what.into() })
            }
            Some(n) => {
                self.fail_create_in = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn map_gate(&mut self, what: &str) -> Result<(), DeviceError> {
        if self.fail_next_map {
            self.fail_next_map = false;
            return Err(DeviceError::MapFailed { what: what.into() });
        }
        Ok(())
    }
}

impl Device for TraceDevice {
    fn create_vertex_buffer(
        &mut self,
        _bytes: &[u8],
        usage: BufferUsage,
    ) -> Result<VertexBufferId, DeviceError> {
        self.creation_gate("vertex buffer")?;
        let id = VertexBufferId(self.take_id());
        self.vertex_buffers.insert(id.0, usage);
        self.ops.push(TraceOp::CreateVertexBuffer(id));
        Ok(id)
    }

    fn create_index_buffer(&mut self, _bytes: &[u8]) -> Result<IndexBufferId, DeviceError> {
        self.creation_gate("index buffer")?;
        let id = IndexBufferId(self.take_id());
        self.index_buffers.insert(id.0);
        self.ops.push(TraceOp::CreateIndexBuffer(id));
        Ok(id)
    }

    fn create_constant_buffer(&mut self, size: usize) -> Result<ConstantBufferId, DeviceError> {
        self.creation_gate("constant buffer")?;
        let id = ConstantBufferId(self.take_id());
        self.constant_buffers.insert(id.0, size);
        self.ops.push(TraceOp::CreateConstantBuffer(id));
        Ok(id)
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureId, DeviceError> {
        self.creation_gate("texture")?;
        if rgba.len() != (width * height * 4) as usize {
            return Err(DeviceError::ResourceCreation {
                what: format!("{width}x{height} texture with {} bytes of pixel data", rgba.len()),
            });
        }
        let id = TextureId(self.take_id());
        self.textures.insert(id.0);
        self.ops.push(TraceOp::CreateTexture(id));
        Ok(id)
    }

    fn write_vertex_buffer(
        &mut self,
        buffer: VertexBufferId,
        _bytes: &[u8],
    ) -> Result<(), DeviceError> {
        self.map_gate("vertex buffer")?;
        match self.vertex_buffers.get(&buffer.0) {
            Some(BufferUsage::Dynamic) => {
                self.ops.push(TraceOp::WriteVertexBuffer(buffer));
                Ok(())
            }
            Some(BufferUsage::Static) => Err(DeviceError::MapFailed {
                what: format!("static vertex buffer {}", buffer.0),
            }),
            None => Err(DeviceError::InvalidHandle {
                what: format!("vertex buffer {}", buffer.0),
            }),
        }
    }

    fn write_constant_buffer(
        &mut self,
        buffer: ConstantBufferId,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        self.map_gate("constant buffer")?;
        match self.constant_buffers.get(&buffer.0) {
            Some(size) if *size == bytes.len() => {
                self.ops.push(TraceOp::WriteConstantBuffer(buffer));
                Ok(())
            }
            Some(size) => Err(DeviceError::MapFailed {
                what: format!(
                    "constant buffer {} ({} bytes written into {size})",
                    buffer.0,
                    bytes.len()
                ),
            }),
            None => Err(DeviceError::InvalidHandle {
                what: format!("constant buffer {}", buffer.0),
            }),
        }
    }

    fn release_vertex_buffer(&mut self, buffer: VertexBufferId) {
        if self.vertex_buffers.remove(&buffer.0).is_some() {
            self.ops.push(TraceOp::ReleaseVertexBuffer(buffer));
        }
    }

    fn release_index_buffer(&mut self, buffer: IndexBufferId) {
        if self.index_buffers.remove(&buffer.0) {
            self.ops.push(TraceOp::ReleaseIndexBuffer(buffer));
        }
    }

    fn release_constant_buffer(&mut self, buffer: ConstantBufferId) {
        if self.constant_buffers.remove(&buffer.0).is_some() {
            self.ops.push(TraceOp::ReleaseConstantBuffer(buffer));
        }
    }

    fn release_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture.0) {
            self.ops.push(TraceOp::ReleaseTexture(texture));
        }
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
        self.ops.push(TraceOp::SetCullMode(mode));
    }

    fn set_depth_enabled(&mut self, enabled: bool) {
        self.depth_enabled = enabled;
        self.ops.push(TraceOp::SetDepthEnabled(enabled));
    }

    fn set_topology(&mut self, topology: Topology) {
        self.ops.push(TraceOp::SetTopology(topology));
    }

    fn bind_vertex_buffer(&mut self, buffer: VertexBufferId, _stride: u32, _offset: u32) {
        self.ops.push(TraceOp::BindVertexBuffer(buffer));
    }

    fn bind_index_buffer(&mut self, buffer: IndexBufferId) {
        self.ops.push(TraceOp::BindIndexBuffer(buffer));
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) {
        self.ops.push(TraceOp::BindTexture { slot, texture });
    }

    fn bind_constant_buffer(&mut self, slot: u32, buffer: ConstantBufferId) {
        self.ops.push(TraceOp::BindConstantBuffer { slot, buffer });
    }

    fn draw_indexed(&mut self, index_count: u32) -> Result<(), DeviceError> {
        if self.lost {
            return Err(DeviceError::DeviceLost);
        }
        self.ops.push(TraceOp::DrawIndexed(index_count));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique() {
        let mut device = TraceDevice::new();
        let a = device.create_vertex_buffer(&[0; 4], BufferUsage::Static).unwrap();
        let b = device.create_vertex_buffer(&[0; 4], BufferUsage::Static).unwrap();
        assert_ne!(a, b);
        assert_eq!(device.live_resource_count(), 2);
    }

    #[test]
    fn write_to_static_buffer_fails() {
        let mut device = TraceDevice::new();
        let id = device.create_vertex_buffer(&[0; 4], BufferUsage::Static).unwrap();
        assert!(matches!(
            device.write_vertex_buffer(id, &[1; 4]),
            Err(DeviceError::MapFailed { .. })
        ));
    }

    #[test]
    fn write_to_released_buffer_is_reported() {
        let mut device = TraceDevice::new();
        let id = device.create_vertex_buffer(&[0; 4], BufferUsage::Dynamic).unwrap();
        device.release_vertex_buffer(id);
        assert!(matches!(
            device.write_vertex_buffer(id, &[1; 4]),
            Err(DeviceError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn double_release_records_once() {
        let mut device = TraceDevice::new();
        let id = device.create_texture(1, 1, &[0; 4]).unwrap();
        device.release_texture(id);
        device.release_texture(id);
        assert_eq!(device.texture_release_count(), 1);
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn injected_map_failure_fires_once() {
        let mut device = TraceDevice::new();
        let id = device.create_vertex_buffer(&[0; 4], BufferUsage::Dynamic).unwrap();
        device.fail_next_map();
        assert!(device.write_vertex_buffer(id, &[1; 4]).is_err());
        assert!(device.write_vertex_buffer(id, &[1; 4]).is_ok());
        assert_eq!(device.vertex_write_count(), 1);
    }

    #[test]
    fn lost_device_fails_draws() {
        let mut device = TraceDevice::new();
        assert!(device.draw_indexed(6).is_ok());
        device.mark_lost();
        assert!(matches!(device.draw_indexed(6), Err(DeviceError::DeviceLost)));
    }

    #[test]
    fn texture_size_is_validated() {
        let mut device = TraceDevice::new();
        assert!(device.create_texture(2, 2, &[0; 16]).is_ok());
        assert!(device.create_texture(2, 2, &[0; 15]).is_err());
    }
}

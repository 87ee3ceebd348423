use serde::{Deserialize, Serialize};

use crate::{BufferUsage, Device, DeviceError, IndexBufferId, Topology, VertexBufferId};

/// A vertex/index buffer pair with its binding parameters.
///
/// The handle pair is all-or-nothing: `create` either produces both buffers
/// or releases the partial one and fails. `release` takes the handles out,
/// so a second release (or a release after shutdown elsewhere) is a no-op
/// rather than a double-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    vertex_buffer: Option<VertexBufferId>,
    index_buffer: Option<IndexBufferId>,
    stride: u32,
    offset: u32,
    index_count: u32,
}

impl Geometry {
    pub fn create(
        device: &mut dyn Device,
        vertex_bytes: &[u8],
        stride: u32,
        index_bytes: &[u8],
        index_count: u32,
        usage: BufferUsage,
    ) -> Result<Self, DeviceError> {
        let vertex_buffer = device.create_vertex_buffer(vertex_bytes, usage)?;
        let index_buffer = match device.create_index_buffer(index_bytes) {
            Ok(id) => id,
            Err(err) => {
                device.release_vertex_buffer(vertex_buffer);
                return Err(err);
            }
        };
        Ok(Self {
            vertex_buffer: Some(vertex_buffer),
            index_buffer: Some(index_buffer),
            stride,
            offset: 0,
            index_count,
        })
    }

    pub fn vertex_buffer(&self) -> Option<VertexBufferId> {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> Option<IndexBufferId> {
        self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn is_released(&self) -> bool {
        self.vertex_buffer.is_none()
    }

    /// Bind both buffers and triangle-list topology for drawing.
    pub fn bind(&self, device: &mut dyn Device) -> Result<(), DeviceError> {
        let (Some(vb), Some(ib)) = (self.vertex_buffer, self.index_buffer) else {
            return Err(DeviceError::InvalidHandle {
                what: "geometry was already released".into(),
            });
        };
        device.bind_vertex_buffer(vb, self.stride, self.offset);
        device.bind_index_buffer(ib);
        device.set_topology(Topology::TriangleList);
        Ok(())
    }

    /// Release both buffers. Safe to call more than once.
    pub fn release(&mut self, device: &mut dyn Device) {
        if let Some(vb) = self.vertex_buffer.take() {
            device.release_vertex_buffer(vb);
        }
        if let Some(ib) = self.index_buffer.take() {
            device.release_index_buffer(ib);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TraceDevice;

    fn quad_geometry(device: &mut TraceDevice) -> Geometry {
        let vertices = [0u8; 6 * 20];
        let indices: Vec<u8> = (0..6u16).flat_map(|i| i.to_le_bytes()).collect();
        Geometry::create(device, &vertices, 20, &indices, 6, BufferUsage::Dynamic).unwrap()
    }

    #[test]
    fn create_produces_both_handles() {
        let mut device = TraceDevice::new();
        let geometry = quad_geometry(&mut device);
        assert!(geometry.vertex_buffer().is_some());
        assert!(geometry.index_buffer().is_some());
        assert_eq!(geometry.index_count(), 6);
        assert!(!geometry.is_released());
    }

    #[test]
    fn failed_index_buffer_releases_vertex_buffer() {
        let mut device = TraceDevice::new();
        device.fail_next_create();
        // Vertex creation consumes the injected failure.
        let err = Geometry::create(&mut device, &[0u8; 20], 20, &[0u8; 12], 6, BufferUsage::Static);
        assert!(err.is_err());
        assert_eq!(device.live_resource_count(), 0);

        // Fail on the second (index) creation instead.
        device.fail_create_after(1);
        let err = Geometry::create(&mut device, &[0u8; 20], 20, &[0u8; 12], 6, BufferUsage::Static);
        assert!(err.is_err());
        assert_eq!(device.live_resource_count(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let mut device = TraceDevice::new();
        let mut geometry = quad_geometry(&mut device);
        geometry.release(&mut device);
        assert!(geometry.is_released());
        assert_eq!(device.live_resource_count(), 0);

        // No panic, no double release recorded.
        let releases_before = device.ops().len();
        geometry.release(&mut device);
        assert_eq!(device.ops().len(), releases_before);
    }

    #[test]
    fn bind_after_release_fails() {
        let mut device = TraceDevice::new();
        let mut geometry = quad_geometry(&mut device);
        geometry.release(&mut device);
        assert!(matches!(
            geometry.bind(&mut device),
            Err(DeviceError::InvalidHandle { .. })
        ));
    }
}

//! Asset ingestion: face-based mesh descriptions and raw 32-bpp images.
//!
//! Both loaders produce CPU-side data first ([`GeometryData`], [`ImageData`])
//! and upload through the device in a separate step, so malformed input is
//! rejected before any GPU resource exists.
//!
//! # Invariants
//! - Geometry building is deterministic: identical input yields bit-identical
//!   vertex and index buffers.
//! - A malformed asset fails its own load and nothing else.

pub mod image;
pub mod mesh;

pub use image::{decode_raw_image, load_image, ImageData};
pub use mesh::{build_geometry, parse_mesh, parse_mesh_file, GeometryData, MeshVertex};

use prism_device::DeviceError;

/// Errors from loading a mesh or image asset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed mesh at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("face at line {line} references missing element {index}")]
    FaceIndexOutOfRange { line: usize, index: usize },
    #[error(
        "vertex streams disagree: {positions} positions, {texcoords} texture coordinates, \
         {normals} normals"
    )]
    StreamMismatch {
        positions: usize,
        texcoords: usize,
        normals: usize,
    },
    #[error("vertex stream length {count} is not a whole number of triangles")]
    PartialFace { count: usize },
    #[error("mesh exceeds the 16-bit index range")]
    TooManyVertices,
    #[error("image is {bpp} bits per pixel, expected 32")]
    NotTrueColor { bpp: u8 },
    #[error("image data is truncated ({got} bytes, expected {expected})")]
    Truncated { got: usize, expected: usize },
    #[error("device rejected the asset")]
    Device(#[from] DeviceError),
}

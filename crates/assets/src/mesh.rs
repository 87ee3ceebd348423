//! Face-based mesh parsing and deduplicating geometry construction.
//!
//! The text format: `v x y z` positions, `vt u v` texture coordinates,
//! `vn x y z` normals, `f p/t/n p/t/n p/t/n` triangles with 1-based indices,
//! `#` comments. Texture `v` coordinates are flipped to `1 - v` on load by
//! default, matching assets authored for a top-left origin.

use std::collections::BTreeMap;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use prism_device::{BufferUsage, Device, Geometry};
use tracing::info;

use crate::LoadError;

/// One deduplicated mesh vertex, laid out for direct GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

impl MeshVertex {
    /// Exact bit pattern of the vertex, used as the dedup key. Two vertices
    /// are the same vertex only when every component is bit-identical; there
    /// is deliberately no epsilon, so dedup is fast and deterministic at the
    /// cost of undercounting shared vertices across seams.
    fn bit_key(&self) -> [u32; 8] {
        [
            self.position[0].to_bits(),
            self.position[1].to_bits(),
            self.position[2].to_bits(),
            self.texcoord[0].to_bits(),
            self.texcoord[1].to_bits(),
            self.normal[0].to_bits(),
            self.normal[1].to_bits(),
            self.normal[2].to_bits(),
        ]
    }
}

/// CPU-side deduplicated vertex and index buffers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl GeometryData {
    /// Axis-aligned extent of the positions; zero for an empty mesh.
    pub fn bounding_size(&self) -> Vec3 {
        let mut iter = self.vertices.iter().map(|v| Vec3::from(v.position));
        let Some(first) = iter.next() else {
            return Vec3::ZERO;
        };
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        max - min
    }

    /// Upload to the device as a static vertex/index buffer pair.
    pub fn upload(&self, device: &mut dyn Device) -> Result<Geometry, LoadError> {
        let geometry = Geometry::create(
            device,
            bytemuck::cast_slice(&self.vertices),
            std::mem::size_of::<MeshVertex>() as u32,
            bytemuck::cast_slice(&self.indices),
            self.indices.len() as u32,
            BufferUsage::Static,
        )?;
        Ok(geometry)
    }
}

/// Build deduplicated buffers from parallel per-face-vertex streams.
///
/// The three streams must be the same length and a whole number of
/// triangles. Lookup is an ordered map over the full vertex bit pattern;
/// a miss appends a vertex and a fresh index, a hit reuses the old index.
/// Empty input produces empty buffers.
pub fn build_geometry(
    positions: &[[f32; 3]],
    texcoords: &[[f32; 2]],
    normals: &[[f32; 3]],
) -> Result<GeometryData, LoadError> {
    if positions.len() != texcoords.len() || positions.len() != normals.len() {
        return Err(LoadError::StreamMismatch {
            positions: positions.len(),
            texcoords: texcoords.len(),
            normals: normals.len(),
        });
    }
    if positions.len() % 3 != 0 {
        return Err(LoadError::PartialFace {
            count: positions.len(),
        });
    }

    let mut data = GeometryData::default();
    let mut seen: BTreeMap<[u32; 8], u16> = BTreeMap::new();

    for i in 0..positions.len() {
        let vertex = MeshVertex {
            position: positions[i],
            texcoord: texcoords[i],
            normal: normals[i],
        };
        let index = match seen.get(&vertex.bit_key()) {
            Some(&existing) => existing,
            None => {
                let next = u16::try_from(data.vertices.len())
                    .map_err(|_| LoadError::TooManyVertices)?;
                data.vertices.push(vertex);
                seen.insert(vertex.bit_key(), next);
                next
            }
        };
        data.indices.push(index);
    }

    Ok(data)
}

/// Parse a mesh description and build its deduplicated geometry.
pub fn parse_mesh(source: &str, invert_texcoords: bool) -> Result<GeometryData, LoadError> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut texcoords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    let mut face_positions: Vec<[f32; 3]> = Vec::new();
    let mut face_texcoords: Vec<[f32; 2]> = Vec::new();
    let mut face_normals: Vec<[f32; 3]> = Vec::new();

    for (line_index, raw_line) in source.lines().enumerate() {
        let line = line_index + 1;
        let text = raw_line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let mut tokens = text.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_floats::<3>(tokens, line)?),
            Some("vt") => {
                let [u, v] = parse_floats::<2>(tokens, line)?;
                texcoords.push([u, if invert_texcoords { 1.0 - v } else { v }]);
            }
            Some("vn") => normals.push(parse_floats::<3>(tokens, line)?),
            Some("f") => {
                let refs: Vec<&str> = tokens.collect();
                if refs.len() != 3 {
                    return Err(LoadError::Malformed {
                        line,
                        reason: format!("face has {} vertices, expected 3", refs.len()),
                    });
                }
                for vertex_ref in refs {
                    let (p, t, n) = parse_face_vertex(vertex_ref, line)?;
                    face_positions.push(fetch(&positions, p, line)?);
                    face_texcoords.push(fetch(&texcoords, t, line)?);
                    face_normals.push(fetch(&normals, n, line)?);
                }
            }
            // Unknown directives (object names, smoothing groups) are skipped.
            _ => continue,
        }
    }

    build_geometry(&face_positions, &face_texcoords, &face_normals)
}

/// Load and parse a mesh description from disk.
pub fn parse_mesh_file(
    path: impl AsRef<Path>,
    invert_texcoords: bool,
) -> Result<GeometryData, LoadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let data = parse_mesh(&source, invert_texcoords)?;
    info!(
        path = %path.display(),
        vertices = data.vertices.len(),
        indices = data.indices.len(),
        "loaded mesh"
    );
    Ok(data)
}

fn parse_floats<const N: usize>(
    tokens: std::str::SplitWhitespace<'_>,
    line: usize,
) -> Result<[f32; N], LoadError> {
    let values: Vec<f32> = tokens
        .map(|t| {
            t.parse::<f32>().map_err(|_| LoadError::Malformed {
                line,
                reason: format!("'{t}' is not a number"),
            })
        })
        .collect::<Result<_, _>>()?;
    values.try_into().map_err(|values: Vec<f32>| LoadError::Malformed {
        line,
        reason: format!("expected {N} components, found {}", values.len()),
    })
}

fn parse_face_vertex(text: &str, line: usize) -> Result<(usize, usize, usize), LoadError> {
    let parts: Vec<&str> = text.split('/').collect();
    if parts.len() != 3 {
        return Err(LoadError::Malformed {
            line,
            reason: format!("face vertex '{text}' is not position/texture/normal"),
        });
    }
    let mut indices = [0usize; 3];
    for (slot, part) in indices.iter_mut().zip(parts) {
        *slot = part.parse::<usize>().map_err(|_| LoadError::Malformed {
            line,
            reason: format!("'{part}' is not an index"),
        })?;
    }
    Ok((indices[0], indices[1], indices[2]))
}

/// Resolve a 1-based face index against an element stream.
fn fetch<T: Copy>(elements: &[T], index: usize, line: usize) -> Result<T, LoadError> {
    index
        .checked_sub(1)
        .and_then(|i| elements.get(i))
        .copied()
        .ok_or(LoadError::FaceIndexOutOfRange { line, index })
}

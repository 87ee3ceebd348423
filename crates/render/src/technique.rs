//! Shader techniques and constant-buffer marshaling.
//!
//! A technique owns the constant buffers its shaders read and knows how to
//! pack [`ShaderResources`] into them before a draw. The render and text
//! systems never touch constant buffers directly; they hand a technique the
//! per-draw resources and an index count.
//!
//! # Invariants
//!
//! - Constant-buffer writes always cover the buffer's full declared size.
//! - A technique binds every slot its shaders sample; stale bindings from a
//!   previous draw are never relied on.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use prism_common::{Color, Light};
use prism_device::{ConstantBufferId, Device, DeviceError, TextureId};
use prism_ecs::ShaderKind;

use crate::error::RenderError;

/// Everything a technique may need for one draw. Systems fill in what they
/// have; techniques read only the fields their shaders use.
#[derive(Debug, Clone, Copy)]
pub struct ShaderResources<'a> {
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub textures: &'a [TextureId],
    pub bump_map: Option<TextureId>,
    pub light_map: Option<TextureId>,
    pub color: Option<Color>,
    pub light: Option<&'a Light>,
    pub camera_position: Vec3,
}

impl<'a> ShaderResources<'a> {
    pub fn new(world: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            world,
            view,
            projection,
            textures: &[],
            bump_map: None,
            light_map: None,
            color: None,
            light: None,
            camera_position: Vec3::ZERO,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct MatrixBuffer {
    world: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

impl MatrixBuffer {
    fn pack(resources: &ShaderResources<'_>) -> Self {
        Self {
            world: resources.world.to_cols_array_2d(),
            view: resources.view.to_cols_array_2d(),
            projection: resources.projection.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct LightBuffer {
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
    direction: [f32; 3],
    specular_power: f32,
    camera_position: [f32; 3],
    _pad: f32,
}

impl LightBuffer {
    fn pack(light: &Light, camera_position: Vec3) -> Self {
        Self {
            ambient: light.ambient.to_array(),
            diffuse: light.diffuse.to_array(),
            specular: light.specular.to_array(),
            direction: light.direction.to_array(),
            specular_power: light.specular_power,
            camera_position: camera_position.to_array(),
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ColorBuffer {
    color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct TextureFlagsBuffer {
    has_bump_map: u32,
    has_light_map: u32,
    _pad: [u32; 2],
}

/// One drawable shader pipeline. `render` packs the resources into the
/// technique's constant buffers, binds everything, and issues the draw.
pub trait ShaderTechnique {
    fn render(
        &self,
        device: &mut dyn Device,
        index_count: u32,
        resources: &ShaderResources<'_>,
    ) -> Result<(), DeviceError>;

    /// Release the technique's constant buffers. Idempotent.
    fn release(&mut self, device: &mut dyn Device);
}

/// Lit technique for scene geometry: matrices, diffuse texture array,
/// optional bump and light maps, directional light.
pub struct DefaultTechnique {
    matrix_buffer: Option<ConstantBufferId>,
    light_buffer: Option<ConstantBufferId>,
    flags_buffer: Option<ConstantBufferId>,
}

impl DefaultTechnique {
    pub fn new(device: &mut dyn Device) -> Result<Self, DeviceError> {
        let matrix_buffer = device.create_constant_buffer(std::mem::size_of::<MatrixBuffer>())?;
        let light_buffer = match device.create_constant_buffer(std::mem::size_of::<LightBuffer>()) {
            Ok(id) => id,
            Err(err) => {
                device.release_constant_buffer(matrix_buffer);
                return Err(err);
            }
        };
        let flags_buffer =
            match device.create_constant_buffer(std::mem::size_of::<TextureFlagsBuffer>()) {
                Ok(id) => id,
                Err(err) => {
                    device.release_constant_buffer(matrix_buffer);
                    device.release_constant_buffer(light_buffer);
                    return Err(err);
                }
            };
        Ok(Self {
            matrix_buffer: Some(matrix_buffer),
            light_buffer: Some(light_buffer),
            flags_buffer: Some(flags_buffer),
        })
    }
}

impl ShaderTechnique for DefaultTechnique {
    fn render(
        &self,
        device: &mut dyn Device,
        index_count: u32,
        resources: &ShaderResources<'_>,
    ) -> Result<(), DeviceError> {
        let (matrix_buffer, light_buffer, flags_buffer) =
            match (self.matrix_buffer, self.light_buffer, self.flags_buffer) {
                (Some(m), Some(l), Some(f)) => (m, l, f),
                _ => {
                    return Err(DeviceError::InvalidHandle {
                        what: "released default technique".into(),
                    })
                }
            };

        let matrices = MatrixBuffer::pack(resources);
        device.write_constant_buffer(matrix_buffer, bytemuck::bytes_of(&matrices))?;

        let light = resources.light.copied().unwrap_or_default();
        let light_data = LightBuffer::pack(&light, resources.camera_position);
        device.write_constant_buffer(light_buffer, bytemuck::bytes_of(&light_data))?;

        let flags = TextureFlagsBuffer {
            has_bump_map: resources.bump_map.is_some() as u32,
            has_light_map: resources.light_map.is_some() as u32,
            _pad: [0; 2],
        };
        device.write_constant_buffer(flags_buffer, bytemuck::bytes_of(&flags))?;

        device.bind_constant_buffer(0, matrix_buffer);
        device.bind_constant_buffer(1, light_buffer);
        device.bind_constant_buffer(2, flags_buffer);

        let mut slot = 0;
        for texture in resources.textures {
            device.bind_texture(slot, *texture);
            slot += 1;
        }
        if let Some(bump) = resources.bump_map {
            device.bind_texture(slot, bump);
            slot += 1;
        }
        if let Some(light_map) = resources.light_map {
            device.bind_texture(slot, light_map);
        }

        device.draw_indexed(index_count)
    }

    fn release(&mut self, device: &mut dyn Device) {
        if let Some(id) = self.matrix_buffer.take() {
            device.release_constant_buffer(id);
        }
        if let Some(id) = self.light_buffer.take() {
            device.release_constant_buffer(id);
        }
        if let Some(id) = self.flags_buffer.take() {
            device.release_constant_buffer(id);
        }
    }
}

/// Unlit technique for glyphs and bitmaps: matrices, tint color, one texture.
pub struct FontTechnique {
    matrix_buffer: Option<ConstantBufferId>,
    color_buffer: Option<ConstantBufferId>,
}

impl FontTechnique {
    pub fn new(device: &mut dyn Device) -> Result<Self, DeviceError> {
        let matrix_buffer = device.create_constant_buffer(std::mem::size_of::<MatrixBuffer>())?;
        let color_buffer = match device.create_constant_buffer(std::mem::size_of::<ColorBuffer>()) {
            Ok(id) => id,
            Err(err) => {
                device.release_constant_buffer(matrix_buffer);
                return Err(err);
            }
        };
        Ok(Self {
            matrix_buffer: Some(matrix_buffer),
            color_buffer: Some(color_buffer),
        })
    }
}

impl ShaderTechnique for FontTechnique {
    fn render(
        &self,
        device: &mut dyn Device,
        index_count: u32,
        resources: &ShaderResources<'_>,
    ) -> Result<(), DeviceError> {
        let (matrix_buffer, color_buffer) = match (self.matrix_buffer, self.color_buffer) {
            (Some(m), Some(c)) => (m, c),
            _ => {
                return Err(DeviceError::InvalidHandle {
                    what: "released font technique".into(),
                })
            }
        };

        let matrices = MatrixBuffer::pack(resources);
        device.write_constant_buffer(matrix_buffer, bytemuck::bytes_of(&matrices))?;

        let color = ColorBuffer {
            color: resources.color.unwrap_or(Color::WHITE).to_array(),
        };
        device.write_constant_buffer(color_buffer, bytemuck::bytes_of(&color))?;

        device.bind_constant_buffer(0, matrix_buffer);
        device.bind_constant_buffer(1, color_buffer);

        if let Some(texture) = resources.textures.first() {
            device.bind_texture(0, *texture);
        }

        device.draw_indexed(index_count)
    }

    fn release(&mut self, device: &mut dyn Device) {
        if let Some(id) = self.matrix_buffer.take() {
            device.release_constant_buffer(id);
        }
        if let Some(id) = self.color_buffer.take() {
            device.release_constant_buffer(id);
        }
    }
}

/// Registry mapping a [`ShaderKind`] to the technique that draws it.
pub struct TechniqueSet {
    techniques: BTreeMap<ShaderKind, Box<dyn ShaderTechnique>>,
}

impl TechniqueSet {
    pub fn new() -> Self {
        Self {
            techniques: BTreeMap::new(),
        }
    }

    /// The two first-party techniques, ready to draw.
    pub fn with_defaults(device: &mut dyn Device) -> Result<Self, DeviceError> {
        let mut set = Self::new();
        set.register(ShaderKind::Default, Box::new(DefaultTechnique::new(device)?));
        match FontTechnique::new(device) {
            Ok(font) => set.register(ShaderKind::Font, Box::new(font)),
            Err(err) => {
                set.shutdown(device);
                return Err(err);
            }
        }
        Ok(set)
    }

    pub fn register(&mut self, kind: ShaderKind, technique: Box<dyn ShaderTechnique>) {
        self.techniques.insert(kind, technique);
    }

    pub fn get(&self, kind: ShaderKind) -> Result<&dyn ShaderTechnique, RenderError> {
        self.techniques
            .get(&kind)
            .map(|t| t.as_ref())
            .ok_or(RenderError::MissingTechnique(kind))
    }

    /// Release every registered technique's buffers. Idempotent.
    pub fn shutdown(&mut self, device: &mut dyn Device) {
        for technique in self.techniques.values_mut() {
            technique.release(device);
        }
    }
}

impl Default for TechniqueSet {
    fn default() -> Self {
        Self::new()
    }
}

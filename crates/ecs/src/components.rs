use glam::{Vec2, Vec3};
use prism_common::Color;
use prism_device::{CullMode, Device, Geometry, TextureId};
use serde::{Deserialize, Serialize};

/// Which shader technique draws an entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ShaderKind {
    Default,
    Font,
}

/// Uploaded mesh plus its axis-aligned bounding size, used for culling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub geometry: Geometry,
    pub size: Vec3,
}

impl Model {
    pub fn new(geometry: Geometry, size: Vec3) -> Self {
        Self { geometry, size }
    }

    pub fn release(&mut self, device: &mut dyn Device) {
        self.geometry.release(device);
    }
}

/// What an entity looks like: its model, technique, and texture bindings.
///
/// The appearance owns its model and textures; removing it without releasing
/// them leaks GPU resources, which is why removal goes through
/// [`crate::ComponentStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appearance {
    pub model: Model,
    pub shader: ShaderKind,
    pub textures: Vec<TextureId>,
    pub bump_map: Option<TextureId>,
    pub light_map: Option<TextureId>,
    pub render_enabled: bool,
}

impl Appearance {
    pub fn new(model: Model, shader: ShaderKind, textures: Vec<TextureId>) -> Self {
        Self {
            model,
            shader,
            textures,
            bump_map: None,
            light_map: None,
            render_enabled: true,
        }
    }

    pub fn release(&mut self, device: &mut dyn Device) {
        self.model.release(device);
        for texture in self.textures.drain(..) {
            device.release_texture(texture);
        }
        if let Some(texture) = self.bump_map.take() {
            device.release_texture(texture);
        }
        if let Some(texture) = self.light_map.take() {
            device.release_texture(texture);
        }
    }
}

/// Per-entity override of the default back-face cull state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rasterizer {
    pub cull_mode: CullMode,
}

/// Which frustum test the render system applies to an entity. Entities
/// without this component are always rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullShape {
    Point,
    Sphere,
    Box,
    Cube,
}

/// One on-screen character: its glyph texture, its own quad mesh, and the
/// position/size the quad was last built for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphQuad {
    pub texture: Option<TextureId>,
    pub geometry: Geometry,
    pub position: Vec2,
    pub size: f32,
    last_position: Option<Vec2>,
    last_size: Option<f32>,
}

impl GlyphQuad {
    pub fn new(texture: TextureId, geometry: Geometry, position: Vec2, size: f32) -> Self {
        Self {
            texture: Some(texture),
            geometry,
            position,
            size,
            last_position: None,
            last_size: None,
        }
    }

    /// Whether the quad mesh must be rewritten: true until the first write,
    /// then only when the integer-truncated position or the exact size
    /// changed since the last write.
    pub fn needs_rewrite(&self) -> bool {
        match (self.last_position, self.last_size) {
            (Some(last), Some(last_size)) => {
                self.position.x as i32 != last.x as i32
                    || self.position.y as i32 != last.y as i32
                    || self.size != last_size
            }
            _ => true,
        }
    }

    /// Record that the quad mesh now matches the current position and size.
    pub fn mark_written(&mut self) {
        self.last_position = Some(self.position);
        self.last_size = Some(self.size);
    }

    pub fn release(&mut self, device: &mut dyn Device) {
        if let Some(texture) = self.texture.take() {
            device.release_texture(texture);
        }
        self.geometry.release(device);
    }
}

/// Dynamically updating on-screen text.
///
/// `previous` is the content last realised as GPU resources; `glyphs` always
/// has one entry per character of `previous` between updates, and per
/// character of `text` once an update succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    pub previous: String,
    pub font: String,
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
    pub glyphs: Vec<GlyphQuad>,
}

impl Text {
    pub fn new(font: impl Into<String>, position: Vec2, size: f32, color: Color) -> Self {
        Self {
            text: String::new(),
            previous: String::new(),
            font: font.into(),
            position,
            size,
            color,
            glyphs: Vec::new(),
        }
    }

    /// Set the content to realise on the next text system update.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn release(&mut self, device: &mut dyn Device) {
        for glyph in &mut self.glyphs {
            glyph.release(device);
        }
        self.glyphs.clear();
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_device::{BufferUsage, TraceDevice};

    fn glyph(device: &mut TraceDevice) -> GlyphQuad {
        let texture = device.create_texture(1, 1, &[0; 4]).unwrap();
        let geometry = Geometry::create(
            device,
            &[0u8; 120],
            20,
            &[0u8; 12],
            6,
            BufferUsage::Dynamic,
        )
        .unwrap();
        GlyphQuad::new(texture, geometry, Vec2::new(10.0, 20.0), 16.0)
    }

    #[test]
    fn fresh_glyph_needs_rewrite() {
        let mut device = TraceDevice::new();
        let mut g = glyph(&mut device);
        assert!(g.needs_rewrite());
        g.mark_written();
        assert!(!g.needs_rewrite());
    }

    #[test]
    fn subpixel_motion_does_not_dirty_the_quad() {
        let mut device = TraceDevice::new();
        let mut g = glyph(&mut device);
        g.mark_written();
        g.position = Vec2::new(10.9, 20.9);
        assert!(!g.needs_rewrite());
        g.position = Vec2::new(11.0, 20.0);
        assert!(g.needs_rewrite());
    }

    #[test]
    fn size_change_dirties_the_quad() {
        let mut device = TraceDevice::new();
        let mut g = glyph(&mut device);
        g.mark_written();
        g.size = 17.0;
        assert!(g.needs_rewrite());
    }

    #[test]
    fn glyph_release_is_idempotent() {
        let mut device = TraceDevice::new();
        let mut g = glyph(&mut device);
        g.release(&mut device);
        g.release(&mut device);
        assert_eq!(device.live_resource_count(), 0);
        assert_eq!(device.texture_release_count(), 1);
    }

    #[test]
    fn appearance_release_covers_optional_maps() {
        let mut device = TraceDevice::new();
        let geometry = Geometry::create(
            &mut device,
            &[0u8; 96],
            32,
            &[0u8; 6],
            3,
            BufferUsage::Static,
        )
        .unwrap();
        let diffuse = device.create_texture(1, 1, &[0; 4]).unwrap();
        let bump = device.create_texture(1, 1, &[0; 4]).unwrap();
        let mut appearance = Appearance::new(
            Model::new(geometry, Vec3::ONE),
            ShaderKind::Default,
            vec![diffuse],
        );
        appearance.bump_map = Some(bump);

        appearance.release(&mut device);
        assert_eq!(device.live_resource_count(), 0);
    }
}

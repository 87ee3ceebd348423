//! A textured screen-space quad.
//!
//! The quad's vertex buffer is dynamic and rewritten only when the bitmap
//! actually moved by a whole pixel or changed size; rendering the same
//! placement every frame costs one draw call and no buffer traffic.

use glam::{Mat4, Vec2, Vec3};
use prism_common::ScreenSize;
use prism_device::{CullMode, Device, DeviceError, Geometry, TextureId};
use prism_ecs::ShaderKind;

use crate::error::RenderError;
use crate::screen::{blank_quad, overlay_projection, overlay_view, quad_corners, quad_vertices};
use crate::technique::{ShaderResources, TechniqueSet};

pub struct Bitmap {
    geometry: Geometry,
    texture: Option<TextureId>,
    screen: ScreenSize,
    last_position: Option<Vec2>,
    last_size: Option<Vec2>,
}

impl Bitmap {
    /// Takes ownership of `texture`. If the quad buffers cannot be created
    /// the texture is released before the error is returned.
    pub fn new(
        device: &mut dyn Device,
        screen: ScreenSize,
        texture: TextureId,
    ) -> Result<Self, DeviceError> {
        let geometry = match blank_quad(device) {
            Ok(geometry) => geometry,
            Err(err) => {
                device.release_texture(texture);
                return Err(err);
            }
        };
        Ok(Self {
            geometry,
            texture: Some(texture),
            screen,
            last_position: None,
            last_size: None,
        })
    }

    fn needs_rewrite(&self, position: Vec2, size: Vec2) -> bool {
        match (self.last_position, self.last_size) {
            (Some(last), Some(last_size)) => {
                position.x as i32 != last.x as i32
                    || position.y as i32 != last.y as i32
                    || size != last_size
            }
            _ => true,
        }
    }

    /// Draw the bitmap with its top-left corner at `position` (screen
    /// pixels, origin top-left), stretched to `size` pixels.
    pub fn render(
        &mut self,
        device: &mut dyn Device,
        techniques: &TechniqueSet,
        position: Vec2,
        size: Vec2,
    ) -> Result<(), RenderError> {
        let Some(texture) = self.texture else {
            return Err(RenderError::Device(DeviceError::InvalidHandle {
                what: "released bitmap".into(),
            }));
        };

        if self.needs_rewrite(position, size) {
            let Some(buffer) = self.geometry.vertex_buffer() else {
                return Err(RenderError::Device(DeviceError::InvalidHandle {
                    what: "released bitmap quad".into(),
                }));
            };
            let corners = quad_corners(
                self.screen,
                position.x.trunc(),
                position.y.trunc(),
                size.x,
                size.y,
            );
            let vertices = quad_vertices(corners);
            device
                .write_vertex_buffer(buffer, bytemuck::cast_slice(&vertices))
                .map_err(RenderError::Device)?;
            self.last_position = Some(position);
            self.last_size = Some(size);
        }

        device.set_cull_mode(CullMode::Back);
        device.set_depth_enabled(false);
        self.geometry.bind(device)?;

        let technique = techniques.get(ShaderKind::Font)?;
        let textures = [texture];
        let resources = ShaderResources {
            world: Mat4::IDENTITY,
            view: overlay_view(),
            projection: overlay_projection(self.screen),
            textures: &textures,
            bump_map: None,
            light_map: None,
            color: None,
            light: None,
            camera_position: Vec3::ZERO,
        };
        technique.render(device, self.geometry.index_count(), &resources)?;
        Ok(())
    }

    /// Release the quad buffers and the texture. Idempotent.
    pub fn release(&mut self, device: &mut dyn Device) {
        if let Some(texture) = self.texture.take() {
            device.release_texture(texture);
        }
        self.geometry.release(device);
    }
}

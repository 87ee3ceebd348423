//! Dynamic on-screen text.
//!
//! Each `Text` component realises its string as one glyph quad per
//! character. `update` diffs the wanted string against the one realised last
//! frame and touches only the characters that changed: grown tails are
//! appended, shrunk tails are released, changed prefix characters are
//! re-rasterised in place. Unchanged characters keep their texture and quad.
//!
//! # Invariants
//!
//! - `previous` is assigned only after the whole diff succeeds. On failure
//!   every resource allocated during the attempt is released and the
//!   component is left exactly as the last successful update left it, so
//!   the next frame retries the identical diff.
//! - After a successful update, `glyphs.len()` equals the character count of
//!   the realised string.

use glam::{Mat4, Vec2, Vec3};
use prism_common::ScreenSize;
use prism_device::{CullMode, Device, DeviceError, TextureId};
use prism_ecs::{ComponentStore, GlyphQuad, ShaderKind, Text};
use tracing::debug;

use crate::error::{RenderError, TextError};
use crate::screen::{blank_quad, overlay_projection, overlay_view, quad_corners, quad_vertices};
use crate::technique::{ShaderResources, TechniqueSet};

/// Supplies glyph textures. The text system trusts what it is given; glyph
/// rasterisation and font lookup live behind this seam.
pub trait FontProvider {
    fn glyph_texture(
        &mut self,
        device: &mut dyn Device,
        font: &str,
        character: char,
    ) -> Result<TextureId, DeviceError>;
}

/// One staged allocation of a content diff, not yet visible on the
/// component. Held only between staging and commit.
enum Staged {
    Replace { index: usize, texture: TextureId },
    Append { glyph: GlyphQuad },
}

impl Staged {
    fn release(self, device: &mut dyn Device) {
        match self {
            Staged::Replace { texture, .. } => device.release_texture(texture),
            Staged::Append { mut glyph } => glyph.release(device),
        }
    }
}

/// Updates and draws every `Text` component.
#[derive(Debug, Clone, Copy)]
pub struct TextSystem {
    screen: ScreenSize,
}

impl TextSystem {
    pub fn new(screen: ScreenSize) -> Self {
        Self { screen }
    }

    /// Update every text component in the store.
    pub fn update_all(
        &self,
        device: &mut dyn Device,
        fonts: &mut dyn FontProvider,
        store: &mut ComponentStore,
    ) -> Result<(), TextError> {
        for text in store.texts_mut().values_mut() {
            self.update(device, fonts, text)?;
        }
        Ok(())
    }

    /// Realise `text.text` as glyphs, then rewrite any quad whose position
    /// or size no longer matches its vertex buffer.
    pub fn update(
        &self,
        device: &mut dyn Device,
        fonts: &mut dyn FontProvider,
        text: &mut Text,
    ) -> Result<(), TextError> {
        if text.text != text.previous {
            self.apply_diff(device, fonts, text)?;
        }
        self.rewrite_quads(device, text)?;
        Ok(())
    }

    fn apply_diff(
        &self,
        device: &mut dyn Device,
        fonts: &mut dyn FontProvider,
        text: &mut Text,
    ) -> Result<(), TextError> {
        let current: Vec<char> = text.text.chars().collect();
        let previous: Vec<char> = text.previous.chars().collect();

        // Stage every fallible allocation first. The component is not
        // touched until all of them have succeeded.
        let staged = match Self::stage(device, fonts, text, &current, &previous) {
            Ok(staged) => staged,
            Err(source) => {
                return Err(TextError::UpdateFailed {
                    attempted: text.text.clone(),
                    last_good: text.previous.clone(),
                    source,
                })
            }
        };

        let replaced = staged
            .iter()
            .filter(|s| matches!(s, Staged::Replace { .. }))
            .count();
        let appended = staged.len() - replaced;
        let removed = previous.len().saturating_sub(current.len());

        // Commit. Only infallible operations from here on.
        for item in staged {
            match item {
                Staged::Replace { index, texture } => {
                    let glyph = &mut text.glyphs[index];
                    if let Some(old) = glyph.texture.replace(texture) {
                        device.release_texture(old);
                    }
                }
                Staged::Append { glyph } => text.glyphs.push(glyph),
            }
        }
        while text.glyphs.len() > current.len() {
            if let Some(mut glyph) = text.glyphs.pop() {
                glyph.release(device);
            }
        }
        text.previous = text.text.clone();

        debug!(
            content = %text.text,
            replaced,
            appended,
            removed,
            "text content realised"
        );
        Ok(())
    }

    fn stage(
        device: &mut dyn Device,
        fonts: &mut dyn FontProvider,
        text: &Text,
        current: &[char],
        previous: &[char],
    ) -> Result<Vec<Staged>, DeviceError> {
        let mut staged = Vec::new();
        if let Err(err) = Self::stage_into(device, fonts, text, current, previous, &mut staged) {
            for item in staged {
                item.release(device);
            }
            return Err(err);
        }
        Ok(staged)
    }

    fn stage_into(
        device: &mut dyn Device,
        fonts: &mut dyn FontProvider,
        text: &Text,
        current: &[char],
        previous: &[char],
        staged: &mut Vec<Staged>,
    ) -> Result<(), DeviceError> {
        let shared = current.len().min(previous.len());

        for index in 0..shared {
            if current[index] == previous[index] {
                continue;
            }
            let texture = fonts.glyph_texture(device, &text.font, current[index])?;
            staged.push(Staged::Replace { index, texture });
        }

        for index in previous.len()..current.len() {
            let texture = fonts.glyph_texture(device, &text.font, current[index])?;
            let geometry = match blank_quad(device) {
                Ok(geometry) => geometry,
                Err(err) => {
                    device.release_texture(texture);
                    return Err(err);
                }
            };
            let position = Vec2::new(
                text.position.x + index as f32 * text.size,
                text.position.y,
            );
            staged.push(Staged::Append {
                glyph: GlyphQuad::new(texture, geometry, position, text.size),
            });
        }
        Ok(())
    }

    fn rewrite_quads(&self, device: &mut dyn Device, text: &mut Text) -> Result<(), DeviceError> {
        for glyph in &mut text.glyphs {
            if !glyph.needs_rewrite() {
                continue;
            }
            let Some(buffer) = glyph.geometry.vertex_buffer() else {
                continue;
            };
            let corners = quad_corners(
                self.screen,
                glyph.position.x.trunc(),
                glyph.position.y.trunc(),
                glyph.size,
                2.0 * glyph.size,
            );
            let vertices = quad_vertices(corners);
            device.write_vertex_buffer(buffer, bytemuck::cast_slice(&vertices))?;
            glyph.mark_written();
        }
        Ok(())
    }

    /// Draw every glyph of every text component with the font technique.
    /// An entity whose appearance is disabled draws nothing, text included.
    pub fn render(
        &self,
        device: &mut dyn Device,
        store: &ComponentStore,
        techniques: &TechniqueSet,
    ) -> Result<(), RenderError> {
        let view = overlay_view();
        let projection = overlay_projection(self.screen);

        for (&entity, text) in store.texts() {
            if let Some(appearance) = store.get_appearance(entity) {
                if !appearance.render_enabled {
                    continue;
                }
            }
            let technique = techniques.get(ShaderKind::Font)?;
            for glyph in &text.glyphs {
                let Some(texture) = glyph.texture else {
                    continue;
                };
                device.set_cull_mode(CullMode::Back);
                device.set_depth_enabled(false);
                glyph.geometry.bind(device)?;

                let textures = [texture];
                let resources = ShaderResources {
                    world: Mat4::IDENTITY,
                    view,
                    projection,
                    textures: &textures,
                    bump_map: None,
                    light_map: None,
                    color: Some(text.color),
                    light: None,
                    camera_position: Vec3::ZERO,
                };
                technique.render(device, glyph.geometry.index_count(), &resources)?;
            }
        }
        Ok(())
    }
}

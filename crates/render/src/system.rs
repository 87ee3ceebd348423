//! The scene render system: culls, binds, and draws every visible entity.
//!
//! Entities are visited in component-store order, so draw order is
//! deterministic across runs. There is no sorting pass.

use prism_common::Light;
use prism_device::{CullMode, Device};
use prism_ecs::{ComponentStore, CullShape};
use tracing::debug;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::technique::{ShaderResources, TechniqueSet};

/// Draws the scene once per frame and counts what survived culling.
#[derive(Debug, Default)]
pub struct RenderSystem {
    rendered: usize,
}

impl RenderSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-frame draw counter.
    pub fn begin_frame(&mut self) {
        self.rendered = 0;
    }

    /// Entities drawn since the last `begin_frame`, after culling.
    pub fn rendered_count(&self) -> usize {
        self.rendered
    }

    /// Draw every renderable entity. An entity renders when it has both an
    /// Appearance and a Transform, its appearance is enabled, and its culling
    /// shape (if any) intersects the camera frustum.
    pub fn render(
        &mut self,
        device: &mut dyn Device,
        store: &ComponentStore,
        camera: &Camera,
        techniques: &TechniqueSet,
        light: &Light,
    ) -> Result<(), RenderError> {
        for (&entity, appearance) in store.appearances() {
            if !appearance.render_enabled {
                continue;
            }
            let Some(transform) = store.get_transform(entity) else {
                continue;
            };

            if let Some(shape) = store.get_cull_shape(entity) {
                let scaled = appearance.model.size * transform.scale;
                let position = transform.position;
                let inside = match shape {
                    CullShape::Point => camera.frustum().contains_point(position, 0.0),
                    CullShape::Sphere => {
                        camera.frustum().contains_point(position, 0.5 * scaled.x)
                    }
                    CullShape::Box => camera.frustum().contains_box(position, scaled * 0.5),
                    CullShape::Cube => camera.frustum().contains_cube(position, 0.5 * scaled.x),
                };
                if !inside {
                    continue;
                }
            }

            let cull_mode = store
                .get_rasterizer(entity)
                .map(|r| r.cull_mode)
                .unwrap_or(CullMode::Back);
            device.set_cull_mode(cull_mode);
            device.set_depth_enabled(true);

            appearance.model.geometry.bind(device)?;

            let technique = techniques.get(appearance.shader)?;
            let resources = ShaderResources {
                world: transform.matrix(),
                view: camera.view(),
                projection: camera.projection(),
                textures: &appearance.textures,
                bump_map: appearance.bump_map,
                light_map: appearance.light_map,
                color: None,
                light: Some(light),
                camera_position: camera.position(),
            };
            technique.render(device, appearance.model.geometry.index_count(), &resources)?;
            self.rendered += 1;
        }

        debug!(rendered = self.rendered, "scene pass complete");
        Ok(())
    }
}

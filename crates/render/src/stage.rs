//! The frame driver: one call runs a whole frame in fixed order.
//!
//! Camera update, then text content realisation, then the scene pass, then
//! the screen-space passes (bitmaps, text) on top. A recoverable failure
//! anywhere aborts the frame and is reported as a single render failure;
//! the caller keeps the engine running and tries again next frame. Device
//! loss is the one fatal outcome.

use glam::Vec2;
use prism_common::{Light, ScreenSize};
use prism_device::{Device, DeviceError};
use prism_ecs::ComponentStore;
use prism_input::InputState;
use tracing::{debug, warn};

use crate::bitmap::Bitmap;
use crate::camera::Camera;
use crate::error::{FrameError, RenderError};
use crate::system::RenderSystem;
use crate::technique::TechniqueSet;
use crate::text::{FontProvider, TextSystem};

struct PlacedBitmap {
    bitmap: Bitmap,
    position: Vec2,
    size: Vec2,
}

pub struct Stage {
    camera: Camera,
    techniques: TechniqueSet,
    scene: RenderSystem,
    text: TextSystem,
    bitmaps: Vec<PlacedBitmap>,
    light: Light,
}

impl Stage {
    pub fn new(
        device: &mut dyn Device,
        screen: ScreenSize,
        camera: Camera,
    ) -> Result<Self, DeviceError> {
        Ok(Self {
            camera,
            techniques: TechniqueSet::with_defaults(device)?,
            scene: RenderSystem::new(),
            text: TextSystem::new(screen),
            bitmaps: Vec::new(),
            light: Light::default(),
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn light_mut(&mut self) -> &mut Light {
        &mut self.light
    }

    pub fn techniques_mut(&mut self) -> &mut TechniqueSet {
        &mut self.techniques
    }

    /// Entities drawn by the last scene pass, after culling.
    pub fn rendered_count(&self) -> usize {
        self.scene.rendered_count()
    }

    /// Add a bitmap drawn every frame at a fixed screen placement.
    pub fn add_bitmap(&mut self, bitmap: Bitmap, position: Vec2, size: Vec2) {
        self.bitmaps.push(PlacedBitmap {
            bitmap,
            position,
            size,
        });
    }

    /// Run one frame.
    pub fn frame(
        &mut self,
        device: &mut dyn Device,
        store: &mut ComponentStore,
        fonts: &mut dyn FontProvider,
        input: &InputState,
        delta: f32,
    ) -> Result<(), FrameError> {
        self.camera.update(input, delta);
        self.scene.begin_frame();

        match self.run_passes(device, store, fonts) {
            Ok(()) => {
                debug!(rendered = self.scene.rendered_count(), "frame complete");
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(FrameError::DeviceLost),
            Err(err) => {
                warn!(error = %err, "frame failed to render");
                Err(FrameError::RenderFailed(err))
            }
        }
    }

    fn run_passes(
        &mut self,
        device: &mut dyn Device,
        store: &mut ComponentStore,
        fonts: &mut dyn FontProvider,
    ) -> Result<(), RenderError> {
        self.text.update_all(device, fonts, store)?;
        self.scene
            .render(device, store, &self.camera, &self.techniques, &self.light)?;
        for placed in &mut self.bitmaps {
            placed
                .bitmap
                .render(device, &self.techniques, placed.position, placed.size)?;
        }
        self.text.render(device, store, &self.techniques)?;
        Ok(())
    }

    /// Release everything the stage and the store own. Idempotent.
    pub fn shutdown(&mut self, device: &mut dyn Device, store: &mut ComponentStore) {
        store.shutdown(device);
        for placed in &mut self.bitmaps {
            placed.bitmap.release(device);
        }
        self.bitmaps.clear();
        self.techniques.shutdown(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use prism_common::{Color, EntityId, Transform};
    use prism_device::{BufferUsage, Geometry, TextureId, TraceDevice};
    use prism_ecs::{Appearance, Model, ShaderKind, Text};

    struct StubFonts;

    impl FontProvider for StubFonts {
        fn glyph_texture(
            &mut self,
            device: &mut dyn Device,
            _font: &str,
            _character: char,
        ) -> Result<TextureId, DeviceError> {
            device.create_texture(1, 1, &[255; 4])
        }
    }

    fn spawn_cube(device: &mut TraceDevice, store: &mut ComponentStore, position: Vec3) {
        let geometry = Geometry::create(
            device,
            &[0u8; 24 * 32],
            32,
            &[0u8; 36 * 2],
            36,
            BufferUsage::Static,
        )
        .unwrap();
        let texture = device.create_texture(1, 1, &[255; 4]).unwrap();
        let id = EntityId::new();
        let _ = store.set_appearance(
            id,
            Appearance::new(Model::new(geometry, Vec3::ONE), ShaderKind::Default, vec![texture]),
        );
        store.set_transform(id, Transform::at(position));
    }

    fn stage(device: &mut TraceDevice) -> Stage {
        let camera = Camera::at(Vec3::new(0.0, 0.0, 5.0));
        Stage::new(device, ScreenSize::new(800.0, 600.0), camera).unwrap()
    }

    #[test]
    fn one_frame_runs_every_pass() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let mut stage = stage(&mut device);
        let mut fonts = StubFonts;
        spawn_cube(&mut device, &mut store, Vec3::ZERO);

        let mut text = Text::new("mono", Vec2::new(20.0, 20.0), 16.0, Color::WHITE);
        text.set("FPS: 60");
        let _ = store.set_text(EntityId::new(), text);

        let input = InputState::new();
        stage
            .frame(&mut device, &mut store, &mut fonts, &input, 0.016)
            .unwrap();
        assert_eq!(stage.rendered_count(), 1);
        // One scene draw plus one per glyph.
        assert_eq!(device.draw_count(), 1 + 7);
    }

    #[test]
    fn recoverable_failure_aborts_only_this_frame() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let mut stage = stage(&mut device);
        let mut fonts = StubFonts;

        let mut text = Text::new("mono", Vec2::ZERO, 16.0, Color::WHITE);
        text.set("hi");
        let _ = store.set_text(EntityId::new(), text);

        let input = InputState::new();
        device.fail_next_map();
        let err = stage.frame(&mut device, &mut store, &mut fonts, &input, 0.016);
        assert!(matches!(err, Err(FrameError::RenderFailed(_))));

        stage
            .frame(&mut device, &mut store, &mut fonts, &input, 0.016)
            .unwrap();
    }

    #[test]
    fn device_loss_is_fatal() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let mut stage = stage(&mut device);
        let mut fonts = StubFonts;
        spawn_cube(&mut device, &mut store, Vec3::ZERO);

        device.mark_lost();
        let input = InputState::new();
        let err = stage.frame(&mut device, &mut store, &mut fonts, &input, 0.016);
        assert!(matches!(err, Err(FrameError::DeviceLost)));
    }

    #[test]
    fn bitmaps_draw_after_the_scene() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let mut stage = stage(&mut device);
        let mut fonts = StubFonts;

        let texture = device.create_texture(2, 2, &[0; 16]).unwrap();
        let bitmap = Bitmap::new(&mut device, ScreenSize::new(800.0, 600.0), texture).unwrap();
        stage.add_bitmap(bitmap, Vec2::new(700.0, 10.0), Vec2::new(64.0, 64.0));

        let input = InputState::new();
        stage
            .frame(&mut device, &mut store, &mut fonts, &input, 0.016)
            .unwrap();
        assert_eq!(device.draw_count(), 1);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let mut stage = stage(&mut device);
        let mut fonts = StubFonts;
        spawn_cube(&mut device, &mut store, Vec3::ZERO);

        let texture = device.create_texture(2, 2, &[0; 16]).unwrap();
        let bitmap = Bitmap::new(&mut device, ScreenSize::new(800.0, 600.0), texture).unwrap();
        stage.add_bitmap(bitmap, Vec2::ZERO, Vec2::new(8.0, 8.0));

        let mut text = Text::new("mono", Vec2::ZERO, 16.0, Color::WHITE);
        text.set("bye");
        let _ = store.set_text(EntityId::new(), text);
        let input = InputState::new();
        stage
            .frame(&mut device, &mut store, &mut fonts, &input, 0.016)
            .unwrap();

        stage.shutdown(&mut device, &mut store);
        stage.shutdown(&mut device, &mut store);
        assert_eq!(device.live_resource_count(), 0);
    }
}

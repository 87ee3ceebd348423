use std::collections::BTreeMap;

use prism_common::{EntityId, Transform};
use prism_device::Device;
use tracing::debug;

use crate::components::{Appearance, CullShape, Rasterizer, Text};

/// Component storage for all component kinds.
///
/// Uses `BTreeMap` per kind for deterministic iteration; draw order equals
/// iteration order over entity ids. Setting a component that owns GPU
/// resources returns the replaced one so the caller can release it.
#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    transforms: BTreeMap<EntityId, Transform>,
    appearances: BTreeMap<EntityId, Appearance>,
    rasterizers: BTreeMap<EntityId, Rasterizer>,
    cull_shapes: BTreeMap<EntityId, CullShape>,
    texts: BTreeMap<EntityId, Text>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Transform ---
    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.transforms.insert(entity, transform);
    }

    pub fn get_transform(&self, entity: EntityId) -> Option<&Transform> {
        self.transforms.get(&entity)
    }

    pub fn get_transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.transforms.get_mut(&entity)
    }

    pub fn remove_transform(&mut self, entity: EntityId) -> Option<Transform> {
        self.transforms.remove(&entity)
    }

    // --- Appearance ---
    /// Attach an appearance; the previous one, if any, is handed back so its
    /// GPU resources can be released by the caller.
    #[must_use = "release the replaced appearance's GPU resources"]
    pub fn set_appearance(&mut self, entity: EntityId, appearance: Appearance) -> Option<Appearance> {
        self.appearances.insert(entity, appearance)
    }

    pub fn get_appearance(&self, entity: EntityId) -> Option<&Appearance> {
        self.appearances.get(&entity)
    }

    pub fn get_appearance_mut(&mut self, entity: EntityId) -> Option<&mut Appearance> {
        self.appearances.get_mut(&entity)
    }

    pub fn appearances(&self) -> &BTreeMap<EntityId, Appearance> {
        &self.appearances
    }

    // --- Rasterizer ---
    pub fn set_rasterizer(&mut self, entity: EntityId, rasterizer: Rasterizer) {
        self.rasterizers.insert(entity, rasterizer);
    }

    pub fn get_rasterizer(&self, entity: EntityId) -> Option<&Rasterizer> {
        self.rasterizers.get(&entity)
    }

    pub fn remove_rasterizer(&mut self, entity: EntityId) -> Option<Rasterizer> {
        self.rasterizers.remove(&entity)
    }

    // --- Frustum culling ---
    pub fn set_cull_shape(&mut self, entity: EntityId, shape: CullShape) {
        self.cull_shapes.insert(entity, shape);
    }

    pub fn get_cull_shape(&self, entity: EntityId) -> Option<&CullShape> {
        self.cull_shapes.get(&entity)
    }

    pub fn remove_cull_shape(&mut self, entity: EntityId) -> Option<CullShape> {
        self.cull_shapes.remove(&entity)
    }

    // --- Text ---
    #[must_use = "release the replaced text's GPU resources"]
    pub fn set_text(&mut self, entity: EntityId, text: Text) -> Option<Text> {
        self.texts.insert(entity, text)
    }

    pub fn get_text(&self, entity: EntityId) -> Option<&Text> {
        self.texts.get(&entity)
    }

    pub fn get_text_mut(&mut self, entity: EntityId) -> Option<&mut Text> {
        self.texts.get_mut(&entity)
    }

    pub fn texts(&self) -> &BTreeMap<EntityId, Text> {
        &self.texts
    }

    pub fn texts_mut(&mut self) -> &mut BTreeMap<EntityId, Text> {
        &mut self.texts
    }

    /// Remove every component of an entity, releasing owned GPU resources.
    pub fn remove_entity(&mut self, entity: EntityId, device: &mut dyn Device) {
        self.transforms.remove(&entity);
        self.rasterizers.remove(&entity);
        self.cull_shapes.remove(&entity);
        if let Some(mut appearance) = self.appearances.remove(&entity) {
            appearance.release(device);
        }
        if let Some(mut text) = self.texts.remove(&entity) {
            text.release(device);
        }
    }

    /// Release every GPU resource owned by any component. Idempotent.
    pub fn shutdown(&mut self, device: &mut dyn Device) {
        let released = self.appearances.len() + self.texts.len();
        for (_, appearance) in self.appearances.iter_mut() {
            appearance.release(device);
        }
        self.appearances.clear();
        for (_, text) in self.texts.iter_mut() {
            text.release(device);
        }
        self.texts.clear();
        self.transforms.clear();
        self.rasterizers.clear();
        self.cull_shapes.clear();
        debug!(released, "component store shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{GlyphQuad, Model, ShaderKind};
    use glam::{Vec2, Vec3};
    use prism_common::Color;
    use prism_device::{BufferUsage, CullMode, Geometry, TraceDevice};

    fn appearance(device: &mut TraceDevice) -> Appearance {
        let geometry = Geometry::create(
            device,
            &[0u8; 96],
            32,
            &[0u8; 6],
            3,
            BufferUsage::Static,
        )
        .unwrap();
        let texture = device.create_texture(1, 1, &[0; 4]).unwrap();
        Appearance::new(Model::new(geometry, Vec3::ONE), ShaderKind::Default, vec![texture])
    }

    #[test]
    fn one_component_per_kind_per_entity() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let id = EntityId::new();

        let old = store.set_appearance(id, appearance(&mut device));
        assert!(old.is_none());

        let mut replaced = store.set_appearance(id, appearance(&mut device)).unwrap();
        replaced.release(&mut device);
        assert_eq!(store.appearances().len(), 1);
    }

    #[test]
    fn missing_components_read_as_none() {
        let store = ComponentStore::new();
        let id = EntityId::new();
        assert!(store.get_transform(id).is_none());
        assert!(store.get_appearance(id).is_none());
        assert!(store.get_rasterizer(id).is_none());
        assert!(store.get_cull_shape(id).is_none());
        assert!(store.get_text(id).is_none());
    }

    #[test]
    fn deterministic_iteration_order() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let mut ids: Vec<EntityId> = (0..20).map(|_| EntityId::new()).collect();
        for &id in &ids {
            let _ = store.set_appearance(id, appearance(&mut device));
        }
        ids.sort();
        let stored: Vec<EntityId> = store.appearances().keys().copied().collect();
        assert_eq!(stored, ids);
    }

    #[test]
    fn remove_entity_releases_resources() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let id = EntityId::new();
        let _ = store.set_appearance(id, appearance(&mut device));
        store.set_transform(id, Transform::default());
        store.set_rasterizer(id, Rasterizer { cull_mode: CullMode::None });
        store.set_cull_shape(id, CullShape::Sphere);

        store.remove_entity(id, &mut device);
        assert!(store.get_appearance(id).is_none());
        assert!(store.get_transform(id).is_none());
        assert_eq!(device.live_resource_count(), 0);
    }

    #[test]
    fn shutdown_releases_everything_once() {
        let mut device = TraceDevice::new();
        let mut store = ComponentStore::new();
        let a = EntityId::new();
        let b = EntityId::new();
        let _ = store.set_appearance(a, appearance(&mut device));

        let mut text = Text::new("mono", Vec2::ZERO, 16.0, Color::WHITE);
        let texture = device.create_texture(1, 1, &[0; 4]).unwrap();
        let geometry = Geometry::create(
            &mut device,
            &[0u8; 120],
            20,
            &[0u8; 12],
            6,
            BufferUsage::Dynamic,
        )
        .unwrap();
        text.glyphs.push(GlyphQuad::new(texture, geometry, Vec2::ZERO, 16.0));
        text.previous = "a".into();
        let _ = store.set_text(b, text);

        store.shutdown(&mut device);
        assert_eq!(device.live_resource_count(), 0);

        // Second shutdown is a no-op.
        store.shutdown(&mut device);
        assert_eq!(device.live_resource_count(), 0);
    }
}

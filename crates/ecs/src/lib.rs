//! Component model for the prism renderer.
//!
//! Each component kind has its own `BTreeMap` storage keyed by `EntityId`,
//! so systems look components up through typed accessors instead of a
//! type-tag-and-downcast scheme, and iteration order is deterministic.
//!
//! # Invariants
//! - At most one component of a kind per entity (map semantics).
//! - A missing component makes systems skip the entity; it is never an error.
//! - `ComponentStore::shutdown` releases every GPU resource the components
//!   own exactly once; calling it again is a no-op.

pub mod components;
pub mod store;

pub use components::{Appearance, CullShape, GlyphQuad, Model, Rasterizer, ShaderKind, Text};
pub use store::ComponentStore;

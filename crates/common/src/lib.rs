//! Shared plain types used across the prism renderer.
//!
//! # Invariants
//! - `EntityId` is `Ord` so component stores iterate deterministically.
//! - `Transform::advance` keeps every rotation component in `[0, 2π)`.

pub mod types;

pub use types::{Color, EntityId, Light, ScreenSize, Transform};

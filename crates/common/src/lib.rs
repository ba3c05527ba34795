//! Shared value types used across the sandbox crates.

pub mod types;

pub use glam::{IVec2, Vec2};
pub use types::{AssetRef, CommonError, ObjectId, SceneLayer};

pub fn crate_info() -> &'static str {
    "sandbox-common v0.1.0"
}

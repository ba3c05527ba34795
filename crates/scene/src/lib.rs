//! Scene: the container of everything that is drawn and simulated.
//!
//! # Invariants
//! - An object is only drawn or simulated while it is in a scene.
//! - Every scene mutation appends a `SceneEvent`.
//! - Object ids are allocated in ascending order and never reused by a scene.

mod body;
mod composite;
mod map_sprite;
mod scene;
mod sprite;

pub use body::{Body, BodyType, CollisionShape, Fixture, PhysicsMaterial};
pub use composite::{CompositeSprite, SpriteBatchItem};
pub use map_sprite::TmxMapSprite;
pub use scene::{ObjectKind, Scene, SceneError, SceneEvent, SceneObject};
pub use sprite::{ImageSource, Sprite, SpriteDef};

pub fn crate_info() -> &'static str {
    "sandbox-scene v0.1.0"
}

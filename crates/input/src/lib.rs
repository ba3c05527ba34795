//! Sandbox manipulation: which pointer interactions are allowed, which one is
//! active, and how pointer actions change the camera or the scene.
//!
//! # Invariants
//! - The active mode is always an allowed mode.
//! - `Off` is always allowed.

pub mod action;
mod sandbox;

pub use action::Action;
pub use sandbox::{Manipulation, Sandbox, SandboxCamera, SandboxError};

pub fn crate_info() -> &'static str {
    "sandbox-input v0.1.0"
}

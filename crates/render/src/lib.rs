//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - Draw order derives only from scene layers and object ids.
//!
//! The debug text renderer stands in for a GPU backend; consumers depend on
//! the `Renderer` trait only.

mod renderer;

pub use renderer::{render_queue, DebugTextRenderer, Drawable, RenderItem, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "sandbox-render v0.1.0"
}

//! Developer Tooling: read-only scene inspection for debugging and CLIs.

mod inspector;

pub use inspector::{ObjectInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "sandbox-tools v0.1.0"
}

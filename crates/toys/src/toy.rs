use sandbox_assets::AssetStore;
use sandbox_common::CommonError;
use sandbox_input::{Sandbox, SandboxError};
use sandbox_scene::{Scene, SceneError};

/// Errors raised while a toy builds its scene.
#[derive(Debug, thiserror::Error)]
pub enum ToyError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error("invalid toy configuration: {0}")]
    Config(#[from] CommonError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Host-owned state a toy may touch during a lifecycle callback.
pub struct ToyContext<'a> {
    pub scene: &'a mut Scene,
    pub sandbox: &'a mut Sandbox,
    pub assets: &'a AssetStore,
}

/// A demonstration scenario.
pub trait Toy {
    fn name(&self) -> &str;

    /// Called once when the toy is loaded.
    fn create(&mut self, ctx: &mut ToyContext<'_>) -> Result<(), ToyError>;

    /// Called once when the toy is unloaded.
    fn destroy(&mut self, _ctx: &mut ToyContext<'_>) {}

    /// Rebuild the toy's scene from scratch.
    fn reset(&mut self, ctx: &mut ToyContext<'_>) -> Result<(), ToyError>;
}

use sandbox_assets::AssetStore;
use sandbox_input::{Action, Sandbox};
use sandbox_scene::Scene;

use crate::toy::{Toy, ToyContext, ToyError};

/// Owns the scene, sandbox and assets, and drives at most one toy at a time.
pub struct ToyHost {
    scene: Scene,
    sandbox: Sandbox,
    assets: AssetStore,
    toy: Option<Box<dyn Toy>>,
}

impl ToyHost {
    pub fn new(assets: AssetStore) -> Self {
        Self {
            scene: Scene::new(),
            sandbox: Sandbox::new(),
            assets,
            toy: None,
        }
    }

    /// Unload the current toy, then create `toy` against a fresh sandbox.
    ///
    /// On failure the host is left without a toy and with an empty scene.
    pub fn load_toy(&mut self, mut toy: Box<dyn Toy>) -> Result<(), ToyError> {
        self.unload();
        self.sandbox = Sandbox::new();
        let _span = tracing::info_span!("load_toy", toy = toy.name()).entered();
        let created = toy.create(&mut ToyContext {
            scene: &mut self.scene,
            sandbox: &mut self.sandbox,
            assets: &self.assets,
        });
        if let Err(err) = created {
            tracing::warn!(error = %err, "toy failed to load");
            self.scene.clear();
            return Err(err);
        }
        tracing::info!(objects = self.scene.len(), "toy created");
        self.toy = Some(toy);
        Ok(())
    }

    /// Rebuild the current toy's scene. Does nothing without a toy.
    pub fn reset_toy(&mut self) -> Result<(), ToyError> {
        let Some(toy) = self.toy.as_mut() else {
            return Ok(());
        };
        toy.reset(&mut ToyContext {
            scene: &mut self.scene,
            sandbox: &mut self.sandbox,
            assets: &self.assets,
        })?;
        tracing::debug!(toy = toy.name(), objects = self.scene.len(), "toy reset");
        Ok(())
    }

    /// Destroy the current toy and empty the scene.
    pub fn unload(&mut self) {
        if let Some(mut toy) = self.toy.take() {
            toy.destroy(&mut ToyContext {
                scene: &mut self.scene,
                sandbox: &mut self.sandbox,
                assets: &self.assets,
            });
            self.scene.clear();
            tracing::info!(toy = toy.name(), "toy unloaded");
        }
    }

    pub fn step(&mut self, dt: f32) -> Result<(), ToyError> {
        Ok(self.scene.step(dt)?)
    }

    /// Route a pointer action through the sandbox.
    pub fn handle(&mut self, action: &Action) -> bool {
        self.sandbox.handle(action, &mut self.scene)
    }

    pub fn toy_name(&self) -> Option<&str> {
        self.toy.as_deref().map(|t| t.name())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Mutable asset access, e.g. for hot reloading maps.
    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use sandbox_input::Manipulation;
    use sandbox_scene::{Sprite, SpriteDef};

    /// Adds one sprite per reset and counts lifecycle calls.
    #[derive(Default)]
    struct Counter {
        resets: usize,
        fail_create: bool,
    }

    impl Toy for Counter {
        fn name(&self) -> &str {
            "Counter"
        }

        fn create(&mut self, ctx: &mut ToyContext<'_>) -> Result<(), ToyError> {
            ctx.sandbox.allow_manipulation(Manipulation::Pull);
            ctx.sandbox.use_manipulation(Manipulation::Pull)?;
            if self.fail_create {
                ctx.scene.add(Sprite::new(SpriteDef::default())?);
                return Err(ToyError::Sandbox(sandbox_input::SandboxError::UnknownMode(
                    "broken".into(),
                )));
            }
            self.reset(ctx)
        }

        fn reset(&mut self, ctx: &mut ToyContext<'_>) -> Result<(), ToyError> {
            self.resets += 1;
            ctx.scene.clear();
            let mut s = Sprite::new(SpriteDef::default())?;
            s.set_linear_velocity(Vec2::X);
            ctx.scene.add(s);
            Ok(())
        }
    }

    #[test]
    fn load_creates_toy() {
        let mut host = ToyHost::new(AssetStore::new());
        assert!(host.toy_name().is_none());
        host.load_toy(Box::new(Counter::default())).unwrap();
        assert_eq!(host.toy_name(), Some("Counter"));
        assert_eq!(host.scene().len(), 1);
        assert_eq!(host.sandbox().manipulation(), Manipulation::Pull);
    }

    #[test]
    fn reset_and_step() {
        let mut host = ToyHost::new(AssetStore::new());
        host.reset_toy().unwrap();
        host.load_toy(Box::new(Counter::default())).unwrap();
        host.step(0.5).unwrap();
        let (_, s) = host.scene().sprites().next().unwrap();
        assert_eq!(s.position(), Vec2::new(0.5, 0.0));

        host.reset_toy().unwrap();
        let (_, s) = host.scene().sprites().next().unwrap();
        assert_eq!(s.position(), Vec2::ZERO);
        assert_eq!(host.scene().len(), 1);
        assert!(host.step(0.0).is_err());
    }

    #[test]
    fn loading_another_toy_resets_sandbox() {
        let mut host = ToyHost::new(AssetStore::new());
        host.load_toy(Box::new(Counter::default())).unwrap();
        host.unload();
        assert!(host.scene().is_empty());
        assert!(host.toy_name().is_none());

        host.load_toy(Box::new(Counter::default())).unwrap();
        host.load_toy(Box::new(Counter::default())).unwrap();
        assert_eq!(host.scene().len(), 1);
        assert!(!host.sandbox().is_allowed(Manipulation::Pan));
    }

    #[test]
    fn failed_create_leaves_no_toy() {
        let mut host = ToyHost::new(AssetStore::new());
        let err = host.load_toy(Box::new(Counter {
            fail_create: true,
            ..Counter::default()
        }));
        assert!(err.is_err());
        assert!(host.toy_name().is_none());
        assert!(host.scene().is_empty());
    }

    #[test]
    fn pointer_actions_reach_the_sandbox() {
        let mut host = ToyHost::new(AssetStore::new());
        host.load_toy(Box::new(Counter::default())).unwrap();
        let drag = Action::Drag {
            from: Vec2::ZERO,
            to: Vec2::new(1.0, 1.0),
        };
        assert!(host.handle(&drag));
        let (_, s) = host.scene().sprites().next().unwrap();
        assert_eq!(s.linear_velocity(), Vec2::new(2.0, 2.0));
    }
}

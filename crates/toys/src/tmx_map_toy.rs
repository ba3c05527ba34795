use glam::Vec2;
use sandbox_common::{AssetRef, SceneLayer};
use sandbox_input::Manipulation;
use sandbox_scene::{BodyType, ImageSource, PhysicsMaterial, Sprite, SpriteDef, TmxMapSprite};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::toy::{Toy, ToyContext, ToyError};

/// Everything the tile-map toy puts in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TmxMapToyConfig {
    /// Map asset drawn by the map sprite.
    pub map: String,
    pub sprite_name: String,
    pub animation: String,
    pub position: Vec2,
    pub size: Vec2,
    pub layer: SceneLayer,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub collision_radius: f32,
    pub fixed_angle: bool,
    pub linear_velocity: Vec2,
}

impl Default for TmxMapToyConfig {
    fn default() -> Self {
        Self {
            map: "ToyAssets:testtown_map".into(),
            sprite_name: "TestAnimation".into(),
            animation: "ToyAssets:TD_Knight_MoveWest".into(),
            position: Vec2::new(2.0, 0.0),
            size: Vec2::new(1.5, 1.5),
            layer: SceneLayer::clamped(14),
            density: 0.5,
            friction: 0.1,
            restitution: 0.9,
            collision_radius: 0.2,
            fixed_angle: true,
            linear_velocity: Vec2::new(5.0, 3.0),
        }
    }
}

impl TmxMapToyConfig {
    /// Read a JSON config. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToyError> {
        let config: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.map_ref()?;
        config.animation_ref()?;
        Ok(config)
    }

    /// The map asset as a parsed reference.
    pub fn map_ref(&self) -> Result<AssetRef, ToyError> {
        Ok(AssetRef::parse(&self.map)?)
    }

    /// The knight's animation as a parsed reference.
    pub fn animation_ref(&self) -> Result<AssetRef, ToyError> {
        Ok(AssetRef::parse(&self.animation)?)
    }
}

/// Shows a tile map with one bouncing sprite that can be panned around.
#[derive(Debug, Clone, Default)]
pub struct TmxMapToy {
    config: TmxMapToyConfig,
}

impl TmxMapToy {
    /// A toy that builds its scene from `config`.
    pub fn new(config: TmxMapToyConfig) -> Self {
        Self { config }
    }

    /// Settings used by every reset.
    pub fn config(&self) -> &TmxMapToyConfig {
        &self.config
    }

    fn build_sprite(&self, ctx: &ToyContext<'_>) -> Result<Sprite, ToyError> {
        let c = &self.config;
        let animation = c.animation_ref()?;
        if ctx.assets.get_animation(&animation).is_none() {
            tracing::warn!(%animation, "animation asset is not loaded; sprite will draw nothing");
        }
        let mut sprite = Sprite::new(SpriteDef {
            name: Some(c.sprite_name.clone()),
            image: ImageSource::Animation(animation),
            position: c.position,
            size: c.size,
            layer: c.layer,
            body_type: BodyType::Dynamic,
            material: PhysicsMaterial::new(c.density, c.friction, c.restitution)?,
        })?;
        sprite.create_circle_collision_shape(c.collision_radius)?;
        sprite.set_fixed_angle(c.fixed_angle);
        sprite.set_linear_velocity(c.linear_velocity);
        Ok(sprite)
    }
}

impl Toy for TmxMapToy {
    fn name(&self) -> &str {
        "TmxMapToy"
    }

    fn create(&mut self, ctx: &mut ToyContext<'_>) -> Result<(), ToyError> {
        ctx.sandbox.allow_manipulation(Manipulation::Pan);
        ctx.sandbox.use_manipulation(Manipulation::Pan)?;
        self.reset(ctx)
    }

    fn reset(&mut self, ctx: &mut ToyContext<'_>) -> Result<(), ToyError> {
        let _span = tracing::info_span!("tmx_map_toy_reset").entered();
        ctx.scene.clear();

        // Both objects are built before either is added, so a failure leaves
        // the scene empty.
        let map = TmxMapSprite::new(self.config.map_ref()?, ctx.assets)?;
        let sprite = self.build_sprite(ctx)?;
        ctx.scene.add(map);
        ctx.scene.add(sprite);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_assets::{AnimationAsset, AssetStore, ImageAsset};
    use sandbox_input::Sandbox;
    use sandbox_scene::{CollisionShape, Scene, SceneObject};
    use sandbox_tmx::TmxMap;

    fn r(s: &str) -> AssetRef {
        AssetRef::parse(s).unwrap()
    }

    fn assets() -> AssetStore {
        let mut store = AssetStore::new();
        let map = TmxMap::from_json(
            r#"{"width": 2, "height": 2, "tilewidth": 64, "tileheight": 32, "orientation": "isometric",
                "layers": [{"type": "tilelayer", "name": "Ground", "width": 2, "height": 2, "data": [1, 1, 1, 1]}],
                "tilesets": [{"firstgid": 1, "name": "desert", "tilewidth": 64, "tileheight": 32,
                              "image": "desert1.png"}]}"#,
        )
        .unwrap();
        store.register_map(r("ToyAssets:testtown_map"), map).unwrap();
        store
            .register_image(
                r("ToyAssets:TD_Knight"),
                ImageAsset {
                    file: "knight.png".into(),
                    cell_width: 64,
                    cell_height: 64,
                    cell_count: 8,
                },
            )
            .unwrap();
        store
            .register_animation(
                r("ToyAssets:TD_Knight_MoveWest"),
                AnimationAsset {
                    image: r("ToyAssets:TD_Knight"),
                    frames: vec![0, 1, 2, 3],
                    time: 0.5,
                },
            )
            .unwrap();
        store
    }

    fn knight(scene: &Scene) -> &Sprite {
        scene.sprites().next().unwrap().1
    }

    #[test]
    fn default_config_matches_toy_constants() {
        let c = TmxMapToyConfig::default();
        assert_eq!(c.map_ref().unwrap(), r("ToyAssets:testtown_map"));
        assert_eq!(c.layer.index(), 14);
        assert_eq!((c.density, c.friction, c.restitution), (0.5, 0.1, 0.9));
    }

    #[test]
    fn create_selects_pan() {
        let assets = assets();
        let mut scene = Scene::new();
        let mut sandbox = Sandbox::new();
        let mut toy = TmxMapToy::default();
        let mut ctx = ToyContext {
            scene: &mut scene,
            sandbox: &mut sandbox,
            assets: &assets,
        };
        toy.create(&mut ctx).unwrap();
        assert!(sandbox.is_allowed(Manipulation::Pan));
        assert_eq!(sandbox.manipulation(), Manipulation::Pan);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn reset_builds_map_and_knight() {
        let assets = assets();
        let mut scene = Scene::new();
        let mut sandbox = Sandbox::new();
        let mut toy = TmxMapToy::default();
        toy.reset(&mut ToyContext {
            scene: &mut scene,
            sandbox: &mut sandbox,
            assets: &assets,
        })
        .unwrap();

        assert_eq!(scene.len(), 2);
        let (_, map) = scene.map_sprites().next().unwrap();
        assert_eq!(map.map_asset(), &r("ToyAssets:testtown_map"));

        let s = knight(&scene);
        assert_eq!(s.name(), Some("TestAnimation"));
        assert_eq!(s.animation(), Some(&r("ToyAssets:TD_Knight_MoveWest")));
        assert_eq!(s.position(), Vec2::new(2.0, 0.0));
        assert_eq!(s.size(), Vec2::new(1.5, 1.5));
        assert_eq!(s.layer().index(), 14);
        assert_eq!(s.default_material(), PhysicsMaterial::new(0.5, 0.1, 0.9).unwrap());
        assert_eq!(s.collision_shapes().len(), 1);
        assert_eq!(
            s.collision_shapes()[0].shape,
            CollisionShape::Circle {
                radius: 0.2,
                offset: Vec2::ZERO
            }
        );
        assert!(s.fixed_angle());
        assert_eq!(s.linear_velocity(), Vec2::new(5.0, 3.0));
        assert_eq!(s.body().body_type(), BodyType::Dynamic);
    }

    #[test]
    fn reset_replaces_previous_contents() {
        let assets = assets();
        let mut scene = Scene::new();
        let mut sandbox = Sandbox::new();
        scene.add(Sprite::new(SpriteDef::default()).unwrap());
        let mut toy = TmxMapToy::default();
        let mut ctx = ToyContext {
            scene: &mut scene,
            sandbox: &mut sandbox,
            assets: &assets,
        };
        toy.reset(&mut ctx).unwrap();
        toy.reset(&mut ctx).unwrap();
        assert_eq!(scene.len(), 2);
        assert!(scene
            .objects()
            .all(|(_, o)| matches!(o, SceneObject::Map(_)) || o.name() == Some("TestAnimation")));
    }

    #[test]
    fn destroy_leaves_state_alone() {
        let assets = assets();
        let mut scene = Scene::new();
        let mut sandbox = Sandbox::new();
        let mut toy = TmxMapToy::default();
        let mut ctx = ToyContext {
            scene: &mut scene,
            sandbox: &mut sandbox,
            assets: &assets,
        };
        toy.create(&mut ctx).unwrap();
        let events = ctx.scene.events().len();
        toy.destroy(&mut ctx);
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.events().len(), events);
        assert_eq!(sandbox.manipulation(), Manipulation::Pan);
    }

    #[test]
    fn missing_map_fails_reset() {
        let assets = AssetStore::new();
        let mut scene = Scene::new();
        let mut sandbox = Sandbox::new();
        let mut toy = TmxMapToy::default();
        let err = toy.reset(&mut ToyContext {
            scene: &mut scene,
            sandbox: &mut sandbox,
            assets: &assets,
        });
        assert!(matches!(err, Err(ToyError::Scene(_))));
    }

    #[test]
    fn invalid_config_values_are_rejected() {
        let assets = assets();
        let mut scene = Scene::new();
        let mut sandbox = Sandbox::new();
        let mut ctx = ToyContext {
            scene: &mut scene,
            sandbox: &mut sandbox,
            assets: &assets,
        };
        TmxMapToy::default().reset(&mut ctx).unwrap();
        let mut bad_radius = TmxMapToy::new(TmxMapToyConfig {
            collision_radius: -1.0,
            ..TmxMapToyConfig::default()
        });
        assert!(bad_radius.reset(&mut ctx).is_err());
        assert!(ctx.scene.is_empty());

        let mut bad_ref = TmxMapToy::new(TmxMapToyConfig {
            animation: "not-a-ref".into(),
            ..TmxMapToyConfig::default()
        });
        assert!(matches!(bad_ref.reset(&mut ctx), Err(ToyError::Config(_))));
    }

    #[test]
    fn config_load_keeps_defaults_for_missing_fields() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), r#"{"linear_velocity": [1.0, -2.0], "layer": 3}"#).unwrap();
        let config = TmxMapToyConfig::load(tmp.path()).unwrap();
        assert_eq!(config.linear_velocity, Vec2::new(1.0, -2.0));
        assert_eq!(config.layer.index(), 3);
        assert_eq!(config.size, Vec2::new(1.5, 1.5));

        std::fs::write(tmp.path(), r#"{"layer": 40}"#).unwrap();
        assert!(TmxMapToyConfig::load(tmp.path()).is_err());
        std::fs::write(tmp.path(), r#"{"colour": "red"}"#).unwrap();
        assert!(TmxMapToyConfig::load(tmp.path()).is_err());
    }
}

use glam::Vec2;
use sandbox_common::{AssetRef, SceneLayer};

use crate::body::{Body, BodyType, Fixture, PhysicsMaterial};
use crate::scene::SceneError;

/// What a sprite draws.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImageSource {
    #[default]
    None,
    Image { asset: AssetRef, frame: u32 },
    Animation(AssetRef),
}

/// Construction parameters for a [`Sprite`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDef {
    pub name: Option<String>,
    pub image: ImageSource,
    pub position: Vec2,
    pub size: Vec2,
    pub layer: SceneLayer,
    pub body_type: BodyType,
    pub material: PhysicsMaterial,
}

impl Default for SpriteDef {
    fn default() -> Self {
        Self {
            name: None,
            image: ImageSource::None,
            position: Vec2::ZERO,
            size: Vec2::ONE,
            layer: SceneLayer::default(),
            body_type: BodyType::Dynamic,
            material: PhysicsMaterial::default(),
        }
    }
}

/// A single drawable scene object with a rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    name: Option<String>,
    image: ImageSource,
    size: Vec2,
    layer: SceneLayer,
    flip_x: bool,
    flip_y: bool,
    body: Body,
}

impl Sprite {
    pub fn new(def: SpriteDef) -> Result<Self, SceneError> {
        validate_size(def.size)?;
        if !def.position.is_finite() {
            return Err(SceneError::InvalidPosition(def.position));
        }
        Ok(Self {
            name: def.name,
            image: def.image,
            size: def.size,
            layer: def.layer,
            flip_x: false,
            flip_y: false,
            body: Body::new(def.body_type, def.position, def.material),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn image(&self) -> &ImageSource {
        &self.image
    }

    /// Animation asset, when the sprite is animated.
    pub fn animation(&self) -> Option<&AssetRef> {
        match &self.image {
            ImageSource::Animation(a) => Some(a),
            _ => None,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) -> Result<(), SceneError> {
        validate_size(size)?;
        self.size = size;
        Ok(())
    }

    pub fn layer(&self) -> SceneLayer {
        self.layer
    }

    pub fn set_layer(&mut self, layer: SceneLayer) {
        self.layer = layer;
    }

    pub fn flip(&self) -> (bool, bool) {
        (self.flip_x, self.flip_y)
    }

    pub fn set_flip(&mut self, flip_x: bool, flip_y: bool) {
        self.flip_x = flip_x;
        self.flip_y = flip_y;
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn position(&self) -> Vec2 {
        self.body.position()
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.body.set_position(position);
    }

    pub fn default_material(&self) -> PhysicsMaterial {
        self.body.default_material()
    }

    pub fn create_circle_collision_shape(&mut self, radius: f32) -> Result<usize, SceneError> {
        self.body.create_circle_shape(radius, Vec2::ZERO)
    }

    pub fn create_box_collision_shape(&mut self, width: f32, height: f32) -> Result<usize, SceneError> {
        self.body.create_box_shape(width, height, Vec2::ZERO)
    }

    pub fn collision_shapes(&self) -> &[Fixture] {
        self.body.fixtures()
    }

    pub fn set_fixed_angle(&mut self, fixed: bool) {
        self.body.set_fixed_angle(fixed);
    }

    pub fn fixed_angle(&self) -> bool {
        self.body.fixed_angle()
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.body.set_linear_velocity(velocity);
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.body.linear_velocity()
    }

    /// Whether `point` lies inside the sprite's axis-aligned size box.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let half = self.size * 0.5;
        let local = point - self.position();
        local.x.abs() <= half.x && local.y.abs() <= half.y
    }
}

fn validate_size(size: Vec2) -> Result<(), SceneError> {
    if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
        return Err(SceneError::InvalidSize(size));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::CollisionShape;

    fn knight() -> Sprite {
        Sprite::new(SpriteDef {
            name: Some("TestAnimation".into()),
            image: ImageSource::Animation(AssetRef::parse("ToyAssets:TD_Knight_MoveWest").unwrap()),
            position: Vec2::new(2.0, 0.0),
            size: Vec2::splat(1.5),
            layer: SceneLayer::new(14).unwrap(),
            body_type: BodyType::Dynamic,
            material: PhysicsMaterial::new(0.5, 0.1, 0.9).unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn sprite_keeps_construction_values() {
        let s = knight();
        assert_eq!(s.name(), Some("TestAnimation"));
        assert_eq!(s.animation().unwrap().name(), "TD_Knight_MoveWest");
        assert_eq!(s.position(), Vec2::new(2.0, 0.0));
        assert_eq!(s.size(), Vec2::splat(1.5));
        assert_eq!(s.layer().index(), 14);
        assert_eq!(s.body().body_type(), BodyType::Dynamic);
    }

    #[test]
    fn circle_shape_uses_sprite_material() {
        let mut s = knight();
        s.create_circle_collision_shape(0.2).unwrap();
        let fixture = s.collision_shapes()[0];
        assert_eq!(
            fixture.shape,
            CollisionShape::Circle {
                radius: 0.2,
                offset: Vec2::ZERO
            }
        );
        assert_eq!(fixture.material.restitution, 0.9);
    }

    #[test]
    fn rejects_bad_size_and_position() {
        let bad_size = SpriteDef {
            size: Vec2::new(0.0, 1.0),
            ..SpriteDef::default()
        };
        assert!(matches!(Sprite::new(bad_size), Err(SceneError::InvalidSize(_))));

        let bad_pos = SpriteDef {
            position: Vec2::new(f32::INFINITY, 0.0),
            ..SpriteDef::default()
        };
        assert!(matches!(Sprite::new(bad_pos), Err(SceneError::InvalidPosition(_))));
    }

    #[test]
    fn contains_point_uses_size_box() {
        let s = knight();
        assert!(s.contains_point(Vec2::new(2.5, 0.5)));
        assert!(!s.contains_point(Vec2::new(3.0, 0.0)));
    }
}

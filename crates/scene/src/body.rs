use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::scene::SceneError;

/// Surface properties applied to collision shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.2,
            restitution: 0.0,
        }
    }
}

impl PhysicsMaterial {
    /// All three coefficients must be finite and non-negative.
    pub fn new(density: f32, friction: f32, restitution: f32) -> Result<Self, SceneError> {
        for (field, value) in [
            ("density", density),
            ("friction", friction),
            ("restitution", restitution),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SceneError::InvalidMaterial { field, value });
            }
        }
        Ok(Self {
            density,
            friction,
            restitution,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyType {
    Static,
    Kinematic,
    #[default]
    Dynamic,
}

/// Collision geometry in body-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionShape {
    Circle { radius: f32, offset: Vec2 },
    Box { width: f32, height: f32, offset: Vec2 },
}

/// A collision shape together with the material it was created with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixture {
    pub shape: CollisionShape,
    pub material: PhysicsMaterial,
}

/// Rigid-body state of a scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    body_type: BodyType,
    position: Vec2,
    angle: f32,
    linear_velocity: Vec2,
    angular_velocity: f32,
    fixed_angle: bool,
    default_material: PhysicsMaterial,
    fixtures: Vec<Fixture>,
}

impl Body {
    pub fn new(body_type: BodyType, position: Vec2, default_material: PhysicsMaterial) -> Self {
        Self {
            body_type,
            position,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            fixed_angle: false,
            default_material,
            fixtures: Vec::new(),
        }
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Rotation in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Ignored while the body has a fixed angle.
    pub fn set_angular_velocity(&mut self, velocity: f32) {
        if !self.fixed_angle {
            self.angular_velocity = velocity;
        }
    }

    pub fn fixed_angle(&self) -> bool {
        self.fixed_angle
    }

    pub fn set_fixed_angle(&mut self, fixed: bool) {
        self.fixed_angle = fixed;
        if fixed {
            self.angular_velocity = 0.0;
        }
    }

    /// Material given to shapes created from now on.
    pub fn default_material(&self) -> PhysicsMaterial {
        self.default_material
    }

    pub fn set_default_material(&mut self, material: PhysicsMaterial) {
        self.default_material = material;
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Add a circle shape with the current default material. Returns its fixture index.
    pub fn create_circle_shape(&mut self, radius: f32, offset: Vec2) -> Result<usize, SceneError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(SceneError::InvalidShape(format!("circle radius {radius}")));
        }
        Ok(self.push_fixture(CollisionShape::Circle { radius, offset }))
    }

    /// Add an axis-aligned box shape with the current default material.
    pub fn create_box_shape(
        &mut self,
        width: f32,
        height: f32,
        offset: Vec2,
    ) -> Result<usize, SceneError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(SceneError::InvalidShape(format!("box {width}x{height}")));
        }
        Ok(self.push_fixture(CollisionShape::Box {
            width,
            height,
            offset,
        }))
    }

    /// Advance the body by `dt` seconds under `gravity`.
    pub fn integrate(&mut self, dt: f32, gravity: Vec2) {
        match self.body_type {
            BodyType::Static => return,
            BodyType::Dynamic => self.linear_velocity += gravity * dt,
            BodyType::Kinematic => {}
        }
        self.position += self.linear_velocity * dt;
        if !self.fixed_angle {
            self.angle += self.angular_velocity * dt;
        }
    }

    fn push_fixture(&mut self, shape: CollisionShape) -> usize {
        self.fixtures.push(Fixture {
            shape,
            material: self.default_material,
        });
        self.fixtures.len() - 1
    }
}

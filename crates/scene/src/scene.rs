use glam::Vec2;
use sandbox_assets::AssetError;
use sandbox_common::{ObjectId, SceneLayer};
use std::collections::BTreeMap;

use crate::composite::CompositeSprite;
use crate::map_sprite::TmxMapSprite;
use crate::sprite::Sprite;

/// Errors from scene operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid {field} {value}: must be finite and non-negative")]
    InvalidMaterial { field: &'static str, value: f32 },
    #[error("invalid collision shape: {0}")]
    InvalidShape(String),
    #[error("invalid size {0}")]
    InvalidSize(Vec2),
    #[error("invalid position {0}")]
    InvalidPosition(Vec2),
    #[error("invalid map-to-meter factor {0}")]
    InvalidMeterFactor(f32),
    #[error("invalid time step {0}")]
    InvalidTimeStep(f32),
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Sprite,
    Composite,
    Map,
}

/// Anything a scene can own.
#[derive(Debug, Clone)]
pub enum SceneObject {
    Sprite(Sprite),
    Composite(CompositeSprite),
    Map(TmxMapSprite),
}

impl SceneObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Sprite(_) => ObjectKind::Sprite,
            Self::Composite(_) => ObjectKind::Composite,
            Self::Map(_) => ObjectKind::Map,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Sprite(s) => s.name(),
            Self::Composite(c) => Some(c.name()),
            Self::Map(m) => Some(m.map_asset().name()),
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            Self::Sprite(s) => s.position(),
            Self::Composite(c) => c.position(),
            Self::Map(m) => m.position(),
        }
    }

    /// Layers the object draws on. A map draws on one layer per map layer.
    pub fn layers(&self) -> Vec<SceneLayer> {
        match self {
            Self::Sprite(s) => vec![s.layer()],
            Self::Composite(c) => vec![c.layer()],
            Self::Map(m) => m.layers().iter().map(|l| l.layer()).collect(),
        }
    }

    pub fn as_sprite(&self) -> Option<&Sprite> {
        match self {
            Self::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sprite_mut(&mut self) -> Option<&mut Sprite> {
        match self {
            Self::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&TmxMapSprite> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Sprite> for SceneObject {
    fn from(s: Sprite) -> Self {
        Self::Sprite(s)
    }
}

impl From<CompositeSprite> for SceneObject {
    fn from(c: CompositeSprite) -> Self {
        Self::Composite(c)
    }
}

impl From<TmxMapSprite> for SceneObject {
    fn from(m: TmxMapSprite) -> Self {
        Self::Map(m)
    }
}

/// A record of every scene mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Added { id: ObjectId, kind: ObjectKind },
    Removed { id: ObjectId, kind: ObjectKind },
    /// All objects were discarded at once.
    Cleared { removed: usize },
    Stepped { tick: u64, dt: f32 },
}

/// The scene: owns objects, advances their bodies and logs mutations.
///
/// Objects are kept in id order, which is insertion order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: BTreeMap<ObjectId, SceneObject>,
    next_id: u32,
    gravity: Vec2,
    tick: u64,
    elapsed: f64,
    events: Vec<SceneEvent>,
}

impl Scene {
    /// An empty scene with zero gravity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `object` and return its id.
    pub fn add(&mut self, object: impl Into<SceneObject>) -> ObjectId {
        let object = object.into();
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let kind = object.kind();
        tracing::debug!(%id, ?kind, name = object.name(), "object added");
        self.objects.insert(id, object);
        self.events.push(SceneEvent::Added { id, kind });
        id
    }

    /// Remove one object, handing it back to the caller.
    pub fn remove(&mut self, id: ObjectId) -> Result<SceneObject, SceneError> {
        let object = self.objects.remove(&id).ok_or(SceneError::ObjectNotFound(id))?;
        tracing::debug!(%id, "object removed");
        self.events.push(SceneEvent::Removed {
            id,
            kind: object.kind(),
        });
        Ok(object)
    }

    /// Discard every object.
    pub fn clear(&mut self) {
        let removed = self.objects.len();
        self.objects.clear();
        tracing::debug!(removed, "scene cleared");
        self.events.push(SceneEvent::Cleared { removed });
    }

    /// Look up an object by id.
    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// All objects in ascending id order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, o)| (*id, o))
    }

    /// Mutable iteration in ascending id order.
    pub fn objects_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut SceneObject)> {
        self.objects.iter_mut().map(|(id, o)| (*id, o))
    }

    /// Every plain sprite with its id, skipping maps and composites.
    pub fn sprites(&self) -> impl Iterator<Item = (ObjectId, &Sprite)> {
        self.objects()
            .filter_map(|(id, o)| o.as_sprite().map(|s| (id, s)))
    }

    /// Every tile-map object with its id.
    pub fn map_sprites(&self) -> impl Iterator<Item = (ObjectId, &TmxMapSprite)> {
        self.objects().filter_map(|(id, o)| o.as_map().map(|m| (id, m)))
    }

    /// First object with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects()
            .find(|(_, o)| o.name() == Some(name))
            .map(|(id, _)| id)
    }

    /// Number of top-level objects. A map counts once however many layers it has.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Acceleration applied to dynamic bodies each step.
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advance every sprite body by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Result<(), SceneError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SceneError::InvalidTimeStep(dt));
        }
        let _span = tracing::debug_span!("scene_step", tick = self.tick + 1).entered();
        let gravity = self.gravity;
        for object in self.objects.values_mut() {
            if let SceneObject::Sprite(sprite) = object {
                sprite.body_mut().integrate(dt, gravity);
            }
        }
        self.tick += 1;
        self.elapsed += dt as f64;
        self.events.push(SceneEvent::Stepped {
            tick: self.tick,
            dt,
        });
        Ok(())
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}

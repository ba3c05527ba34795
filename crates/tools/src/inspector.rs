use glam::Vec2;
use sandbox_common::ObjectId;
use sandbox_scene::{ObjectKind, Scene, SceneObject};
use std::fmt;

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against the scene for debugging and CLI output.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let count = |kind: ObjectKind| scene.objects().filter(|(_, o)| o.kind() == kind).count();
        SceneSummary {
            tick: scene.tick(),
            object_count: scene.len(),
            sprites: count(ObjectKind::Sprite),
            maps: count(ObjectKind::Map),
            pending_events: scene.events().len(),
        }
    }

    /// Details of a single object.
    pub fn inspect_object(scene: &Scene, id: ObjectId) -> Option<ObjectInfo> {
        scene.get(id).map(|object| {
            let (velocity, detail) = match object {
                SceneObject::Sprite(s) => (
                    s.linear_velocity(),
                    format!(
                        "shapes={} fixed_angle={}",
                        s.collision_shapes().len(),
                        s.fixed_angle()
                    ),
                ),
                SceneObject::Composite(c) => (Vec2::ZERO, format!("items={}", c.len())),
                SceneObject::Map(m) => (
                    Vec2::ZERO,
                    format!("map={} layers={}", m.map_asset(), m.layers().len()),
                ),
            };
            ObjectInfo {
                id,
                kind: object.kind(),
                name: object.name().map(str::to_string),
                layers: object.layers().iter().map(|l| l.index()).collect(),
                position: object.position().to_array(),
                velocity: velocity.to_array(),
                detail,
            }
        })
    }

    /// List all object ids in the scene.
    pub fn list_objects(scene: &Scene) -> Vec<ObjectId> {
        scene.objects().map(|(id, _)| id).collect()
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub tick: u64,
    pub object_count: usize,
    pub sprites: usize,
    pub maps: usize,
    pub pending_events: usize,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scene: tick={} objects={} sprites={} maps={} pending_events={}",
            self.tick, self.object_count, self.sprites, self.maps, self.pending_events
        )
    }
}

/// Detailed info about a single object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub name: Option<String>,
    pub layers: Vec<u32>,
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub detail: String,
}

impl fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Object {} {:?} {:?} layers={:?} pos=({:.2}, {:.2}) vel=({:.2}, {:.2}) {}",
            self.id,
            self.kind,
            self.name.as_deref().unwrap_or("-"),
            self.layers,
            self.position[0],
            self.position[1],
            self.velocity[0],
            self.velocity[1],
            self.detail,
        )
    }
}

use glam::Vec2;
use sandbox_common::ObjectId;
use sandbox_scene::{BodyType, Scene};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::action::Action;

/// Errors from sandbox mode changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    #[error("manipulation mode {0} is not allowed")]
    NotAllowed(Manipulation),
    #[error("unknown manipulation mode {0:?}")]
    UnknownMode(String),
}

/// What a pointer drag does in the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Manipulation {
    #[default]
    Off,
    /// Drag moves the camera.
    Pan,
    /// Drag throws the dynamic sprite under the pointer.
    Pull,
}

impl fmt::Display for Manipulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Pan => "pan",
            Self::Pull => "pull",
        })
    }
}

impl FromStr for Manipulation {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "pan" => Ok(Self::Pan),
            "pull" => Ok(Self::Pull),
            _ => Err(SandboxError::UnknownMode(s.to_string())),
        }
    }
}

/// Sandbox view of the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SandboxCamera {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for SandboxCamera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// Interactive manipulation state shared by every toy.
#[derive(Debug, Clone)]
pub struct Sandbox {
    allowed: BTreeSet<Manipulation>,
    active: Manipulation,
    camera: SandboxCamera,
    pull_strength: f32,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self {
            allowed: BTreeSet::from([Manipulation::Off]),
            active: Manipulation::Off,
            camera: SandboxCamera::default(),
            pull_strength: Self::DEFAULT_PULL_STRENGTH,
        }
    }
}

impl Sandbox {
    /// Velocity per meter of drag applied by `Pull`.
    pub const DEFAULT_PULL_STRENGTH: f32 = 2.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Make `mode` available for selection.
    pub fn allow_manipulation(&mut self, mode: Manipulation) {
        if self.allowed.insert(mode) {
            tracing::debug!(%mode, "manipulation allowed");
        }
    }

    pub fn is_allowed(&self, mode: Manipulation) -> bool {
        self.allowed.contains(&mode)
    }

    pub fn allowed(&self) -> impl Iterator<Item = Manipulation> + '_ {
        self.allowed.iter().copied()
    }

    /// Select the active mode. It must have been allowed first.
    pub fn use_manipulation(&mut self, mode: Manipulation) -> Result<(), SandboxError> {
        if !self.is_allowed(mode) {
            return Err(SandboxError::NotAllowed(mode));
        }
        tracing::debug!(from = %self.active, to = %mode, "manipulation selected");
        self.active = mode;
        Ok(())
    }

    pub fn manipulation(&self) -> Manipulation {
        self.active
    }

    pub fn camera(&self) -> &SandboxCamera {
        &self.camera
    }

    pub fn pull_strength(&self) -> f32 {
        self.pull_strength
    }

    pub fn set_pull_strength(&mut self, strength: f32) {
        if strength.is_finite() && strength >= 0.0 {
            self.pull_strength = strength;
        }
    }

    /// Apply a pointer action. Returns whether anything changed.
    pub fn handle(&mut self, action: &Action, scene: &mut Scene) -> bool {
        match *action {
            Action::Drag { from, to } => match self.active {
                Manipulation::Off => false,
                Manipulation::Pan => {
                    let delta = from - to;
                    self.camera.position += delta;
                    delta != Vec2::ZERO
                }
                Manipulation::Pull => self.pull(scene, from, to),
            },
            Action::Zoom(factor) => {
                if !factor.is_finite() || factor <= 0.0 {
                    tracing::warn!(factor, "ignoring invalid zoom factor");
                    return false;
                }
                self.camera.zoom *= factor;
                factor != 1.0
            }
            Action::ResetCamera => {
                let changed = self.camera != SandboxCamera::default();
                self.camera = SandboxCamera::default();
                changed
            }
        }
    }

    fn pull(&self, scene: &mut Scene, from: Vec2, to: Vec2) -> bool {
        let Some(target) = pick_dynamic_sprite(scene, from) else {
            return false;
        };
        let velocity = (to - from) * self.pull_strength;
        if let Some(sprite) = scene.get_mut(target).and_then(|o| o.as_sprite_mut()) {
            sprite.set_linear_velocity(velocity);
            tracing::debug!(%target, ?velocity, "sprite pulled");
        }
        true
    }
}

/// Front-most dynamic sprite under `point`; the newest wins within a layer.
fn pick_dynamic_sprite(scene: &Scene, point: Vec2) -> Option<ObjectId> {
    scene
        .sprites()
        .filter(|(_, s)| s.body().body_type() == BodyType::Dynamic && s.contains_point(point))
        .min_by_key(|(id, s)| (s.layer(), std::cmp::Reverse(*id)))
        .map(|(id, _)| id)
}

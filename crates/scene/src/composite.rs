use glam::Vec2;
use sandbox_common::{AssetRef, SceneLayer};

/// One image cell inside a composite sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteBatchItem {
    /// Position relative to the owning composite.
    pub logical_position: Vec2,
    pub image: AssetRef,
    pub frame: u32,
    pub size: Vec2,
    pub flip_x: bool,
    pub flip_y: bool,
}

/// A batch of image cells drawn together on one scene layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSprite {
    name: String,
    position: Vec2,
    layer: SceneLayer,
    items: Vec<SpriteBatchItem>,
}

impl CompositeSprite {
    pub fn new(name: impl Into<String>, position: Vec2, layer: SceneLayer) -> Self {
        Self {
            name: name.into(),
            position,
            layer,
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn layer(&self) -> SceneLayer {
        self.layer
    }

    /// Append an item and return its index.
    pub fn add_sprite(&mut self, item: SpriteBatchItem) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn items(&self) -> &[SpriteBatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// World position of an item.
    pub fn world_position(&self, item: &SpriteBatchItem) -> Vec2 {
        self.position + item.logical_position
    }
}

use glam::{IVec2, Vec2};
use sandbox_assets::AssetStore;
use sandbox_common::{AssetRef, SceneLayer};
use sandbox_tmx::{MapGeometry, TmxMap};
use std::collections::HashMap;
use std::sync::Arc;

use crate::body::BodyType;
use crate::composite::{CompositeSprite, SpriteBatchItem};
use crate::scene::SceneError;

/// Layer/object-group property choosing the scene layer.
pub const LAYER_PROPERTY: &str = "layer";
/// Tileset property naming the image asset explicitly.
pub const ASSET_NAME_PROPERTY: &str = "AssetName";

/// Static scene object that draws a Tiled map as one composite sprite per map layer.
#[derive(Debug, Clone)]
pub struct TmxMapSprite {
    map_asset: AssetRef,
    map: Arc<TmxMap>,
    /// Image asset per tileset, resolved once per map.
    tileset_assets: Vec<Option<AssetRef>>,
    position: Vec2,
    map_to_meter_factor: f32,
    layers: Vec<CompositeSprite>,
}

impl TmxMapSprite {
    pub const DEFAULT_MAP_TO_METER_FACTOR: f32 = 0.03;

    /// Load `map_asset` from `assets` and build its layers.
    pub fn new(map_asset: AssetRef, assets: &AssetStore) -> Result<Self, SceneError> {
        let map = assets.get_map(&map_asset)?;
        let tileset_assets = resolve_tileset_assets(&map, assets);
        let mut sprite = Self {
            map_asset,
            map,
            tileset_assets,
            position: Vec2::ZERO,
            map_to_meter_factor: Self::DEFAULT_MAP_TO_METER_FACTOR,
            layers: Vec::new(),
        };
        sprite.build_map();
        Ok(sprite)
    }

    pub fn map_asset(&self) -> &AssetRef {
        &self.map_asset
    }

    pub fn map(&self) -> &TmxMap {
        &self.map
    }

    pub fn body_type(&self) -> BodyType {
        BodyType::Static
    }

    pub fn layers(&self) -> &[CompositeSprite] {
        &self.layers
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Move the map together with all of its layers.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        for layer in &mut self.layers {
            layer.set_position(position);
        }
    }

    /// Scene meters per map pixel.
    pub fn map_to_meter_factor(&self) -> f32 {
        self.map_to_meter_factor
    }

    /// Change the pixel scale and rebuild the layers.
    pub fn set_map_to_meter_factor(&mut self, factor: f32) -> Result<(), SceneError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(SceneError::InvalidMeterFactor(factor));
        }
        self.map_to_meter_factor = factor;
        self.build_map();
        Ok(())
    }

    /// Value of `property` on the tile at `(x, y)` of the named layer.
    pub fn tile_property(&self, layer: &str, property: &str, x: u32, y: u32) -> Option<&str> {
        let tile = self.map.layer(layer)?.tile(x, y)?;
        self.map.tilesets[tile.tileset]
            .tile_properties(tile.id)?
            .literal(property)
    }

    /// Tile coordinate under a world-space point.
    pub fn world_coord_to_tile(&self, world: Vec2) -> IVec2 {
        let pixel = (world - self.position) / self.map_to_meter_factor;
        MapGeometry::new(&self.map).coord_to_tile_index(pixel)
    }

    fn build_map(&mut self) {
        let _span = tracing::info_span!("build_map", map = %self.map_asset).entered();
        let map = Arc::clone(&self.map);
        let geometry = MapGeometry::new(&map);
        let factor = self.map_to_meter_factor;
        self.layers.clear();

        for layer in &map.layers {
            let mut composite = self.create_layer(&layer.name, layer.properties.numeric(LAYER_PROPERTY));
            for x in 0..map.width {
                for y in 0..map.height {
                    let Some(tile) = layer.tile(x, y) else {
                        continue;
                    };
                    let Some(image) = self.tileset_assets[tile.tileset].clone() else {
                        continue;
                    };
                    let tileset = &map.tilesets[tile.tileset];
                    let sprite_size = Vec2::new(tileset.tile_width as f32, tileset.tile_height as f32);
                    let pixel = geometry.tile_to_coord(Vec2::new(x as f32, y as f32))
                        + (sprite_size - geometry.tile_size) / 2.0;
                    composite.add_sprite(SpriteBatchItem {
                        logical_position: pixel * factor,
                        image,
                        frame: tile.id,
                        size: sprite_size * factor,
                        flip_x: tile.flipped_horizontally,
                        flip_y: tile.flipped_vertically,
                    });
                }
            }
            tracing::debug!(layer = %layer.name, tiles = composite.len(), "tile layer built");
            self.layers.push(composite);
        }

        for group in &map.object_groups {
            let mut composite = self.create_layer(&group.name, group.properties.numeric(LAYER_PROPERTY));
            for object in &group.objects {
                let Some((index, tileset)) = object.gid.and_then(|gid| map.find_tileset(gid)) else {
                    continue;
                };
                let Some(image) = self.tileset_assets[index].clone() else {
                    continue;
                };
                let sprite_size = Vec2::new(tileset.tile_width as f32, tileset.tile_height as f32);
                let tile = geometry.coord_to_tile(Vec2::new(object.x, object.y))
                    - geometry.object_anchor_offset();
                let pixel = geometry.tile_to_coord(tile) + (sprite_size - geometry.tile_size) / 2.0;
                composite.add_sprite(SpriteBatchItem {
                    logical_position: pixel * factor,
                    image,
                    frame: object.gid.unwrap_or(0) - tileset.first_gid,
                    size: sprite_size * factor,
                    flip_x: false,
                    flip_y: false,
                });
            }
            tracing::debug!(group = %group.name, objects = composite.len(), "object layer built");
            self.layers.push(composite);
        }
    }

    fn create_layer(&self, name: &str, layer: i32) -> CompositeSprite {
        CompositeSprite::new(name, self.position, SceneLayer::clamped(layer as i64))
    }
}

/// Pick the image asset for every tileset.
///
/// An explicit `AssetName` property wins; otherwise the tileset image's file
/// stem is looked up by asset name and the first hit is used.
fn resolve_tileset_assets(map: &TmxMap, assets: &AssetStore) -> Vec<Option<AssetRef>> {
    let mut by_stem: HashMap<&str, Option<AssetRef>> = HashMap::new();
    map.tilesets
        .iter()
        .map(|tileset| {
            if let Some(named) = tileset.properties.literal(ASSET_NAME_PROPERTY) {
                match AssetRef::parse(named) {
                    Ok(asset) => return Some(asset),
                    Err(_) => return assets.find_asset_name(named).into_iter().next(),
                }
            }
            let resolved = tileset.image_stem().and_then(|stem| {
                by_stem
                    .entry(stem)
                    .or_insert_with(|| assets.find_asset_name(stem).into_iter().next())
                    .clone()
            });
            if resolved.is_none() {
                tracing::warn!(tileset = %tileset.name, "no image asset for tileset; its tiles are skipped");
            }
            resolved
        })
        .collect()
}

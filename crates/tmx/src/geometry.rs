use glam::{IVec2, Vec2};

use crate::map::{Orientation, TmxMap};

/// Conversions between tile coordinates and map pixels.
///
/// Pixel space is y-up with the origin at the vertical centre of the map's
/// left edge, so a map can be scaled straight into scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapGeometry {
    pub tile_size: Vec2,
    pub origin: Vec2,
    pub orientation: Orientation,
}

impl MapGeometry {
    pub fn new(map: &TmxMap) -> Self {
        let tile_size = Vec2::new(map.tile_width as f32, map.tile_height as f32);
        let origin = Vec2::new(0.0, map.pixel_height() / 2.0 - tile_size.y / 2.0);
        Self {
            tile_size,
            origin,
            orientation: map.orientation,
        }
    }

    /// Pixel position of the centre of `tile`.
    pub fn tile_to_coord(&self, tile: Vec2) -> Vec2 {
        let th = self.tile_size.y;
        match self.orientation {
            Orientation::Isometric => Vec2::new(
                (tile.x - tile.y) * th,
                self.origin.y - (tile.x + tile.y) * th * 0.5,
            ),
            Orientation::Orthogonal => Vec2::new(
                self.origin.x + tile.x * self.tile_size.x,
                self.origin.y - tile.y * th,
            ),
        }
    }

    /// Tile coordinate of a point given in Tiled's object space (pixels, y-down).
    ///
    /// Isometric object coordinates are measured in tile heights along both axes.
    pub fn coord_to_tile(&self, pixel: Vec2) -> Vec2 {
        match self.orientation {
            Orientation::Isometric => pixel / self.tile_size.y,
            Orientation::Orthogonal => pixel / self.tile_size,
        }
    }

    /// Nearest tile whose centre `tile_to_coord` would place at `pixel`.
    pub fn coord_to_tile_index(&self, pixel: Vec2) -> IVec2 {
        let th = self.tile_size.y;
        let tile = match self.orientation {
            Orientation::Isometric => {
                let diff = pixel.x / th;
                let sum = 2.0 * (self.origin.y - pixel.y) / th;
                Vec2::new((sum + diff) * 0.5, (sum - diff) * 0.5)
            }
            Orientation::Orthogonal => Vec2::new(
                (pixel.x - self.origin.x) / self.tile_size.x,
                (self.origin.y - pixel.y) / th,
            ),
        };
        tile.round().as_ivec2()
    }

    /// Offset applied to tile objects, which Tiled anchors at their bottom corner.
    pub fn object_anchor_offset(&self) -> Vec2 {
        match self.orientation {
            Orientation::Isometric => Vec2::ONE,
            Orientation::Orthogonal => Vec2::new(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(orientation: Orientation, tw: f32, th: f32, rows: f32) -> MapGeometry {
        MapGeometry {
            tile_size: Vec2::new(tw, th),
            origin: Vec2::new(0.0, rows * th / 2.0 - th / 2.0),
            orientation,
        }
    }

    #[test]
    fn isometric_tile_to_coord() {
        let g = geometry(Orientation::Isometric, 64.0, 32.0, 3.0);
        assert_eq!(g.origin, Vec2::new(0.0, 32.0));
        assert_eq!(g.tile_to_coord(Vec2::ZERO), Vec2::new(0.0, 32.0));
        assert_eq!(g.tile_to_coord(Vec2::new(1.0, 0.0)), Vec2::new(32.0, 16.0));
        assert_eq!(g.tile_to_coord(Vec2::new(0.0, 1.0)), Vec2::new(-32.0, 16.0));
        assert_eq!(g.tile_to_coord(Vec2::new(2.0, 2.0)), Vec2::new(0.0, -32.0));
    }

    #[test]
    fn orthogonal_tile_to_coord() {
        let g = geometry(Orientation::Orthogonal, 16.0, 16.0, 3.0);
        assert_eq!(g.origin, Vec2::new(0.0, 16.0));
        assert_eq!(g.tile_to_coord(Vec2::new(2.0, 1.0)), Vec2::new(32.0, 0.0));
        assert_eq!(g.tile_to_coord(Vec2::new(0.0, 2.0)), Vec2::new(0.0, -16.0));
    }

    #[test]
    fn coord_to_tile_index_inverts_tile_to_coord() {
        for orientation in [Orientation::Isometric, Orientation::Orthogonal] {
            let g = geometry(orientation, 64.0, 32.0, 5.0);
            for x in 0..5 {
                for y in 0..5 {
                    let tile = IVec2::new(x, y);
                    let pixel = g.tile_to_coord(tile.as_vec2());
                    assert_eq!(g.coord_to_tile_index(pixel), tile, "{orientation:?} {tile}");
                    // Points near the centre still land on the same tile.
                    let nudged = pixel + Vec2::new(3.0, -2.0);
                    assert_eq!(g.coord_to_tile_index(nudged), tile);
                }
            }
        }
    }

    #[test]
    fn coord_to_tile_object_space() {
        let iso = geometry(Orientation::Isometric, 64.0, 32.0, 3.0);
        assert_eq!(iso.coord_to_tile(Vec2::new(64.0, 96.0)), Vec2::new(2.0, 3.0));

        let ortho = geometry(Orientation::Orthogonal, 16.0, 8.0, 3.0);
        assert_eq!(ortho.coord_to_tile(Vec2::new(32.0, 16.0)), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn new_uses_map_dimensions() {
        let map = TmxMap::from_json(
            r#"{"width": 4, "height": 6, "tilewidth": 32, "tileheight": 16, "orientation": "isometric"}"#,
        )
        .unwrap();
        let g = MapGeometry::new(&map);
        assert_eq!(g.tile_size, Vec2::new(32.0, 16.0));
        assert_eq!(g.origin, Vec2::new(0.0, 40.0));
        assert_eq!(g.orientation, Orientation::Isometric);
    }
}

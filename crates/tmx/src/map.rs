use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Flip flags stored in the top bits of a global tile id.
pub const FLIPPED_HORIZONTALLY: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY: u32 = 0x2000_0000;
const GID_MASK: u32 = !(FLIPPED_HORIZONTALLY | FLIPPED_VERTICALLY | FLIPPED_DIAGONALLY);

/// Errors from loading a Tiled map.
#[derive(Debug, thiserror::Error)]
pub enum TmxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported map orientation {0:?}")]
    UnsupportedOrientation(String),
    #[error("infinite maps are not supported")]
    InfiniteMap,
    #[error("layer {layer:?} uses unsupported encoding {encoding:?}")]
    UnsupportedEncoding { layer: String, encoding: String },
    #[error("layer {layer:?} has {actual} cells, expected {expected}")]
    LayerSize {
        layer: String,
        expected: usize,
        actual: usize,
    },
    #[error("tileset with firstgid {0} is external; embed it in the map")]
    ExternalTileset(u32),
    #[error("tileset {0:?} is missing its tile size")]
    TilesetMissingSize(String),
    #[error("gid {gid} in layer {layer:?} matches no tileset")]
    UnknownGid { layer: String, gid: u32 },
    #[error("map has zero-sized tiles")]
    ZeroTileSize,
    #[error("map of {width}x{height} tiles is too large")]
    MapTooLarge { width: u32, height: u32 },
    #[error("layer {layer:?} is {width}x{height} tiles, map is {map_width}x{map_height}")]
    LayerDimensions {
        layer: String,
        width: u32,
        height: u32,
        map_width: u32,
        map_height: u32,
    },
}

/// Map projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Orthogonal,
    Isometric,
}

/// Custom properties attached to a map, layer, tileset or tile.
///
/// Values are kept as their textual form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn literal(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Leading integer of the property value, or 0 when absent or not numeric.
    pub fn numeric(&self, name: &str) -> i32 {
        let Some(value) = self.literal(name) else {
            return 0;
        };
        let value = value.trim();
        if let Ok(n) = value.parse::<i32>() {
            return n;
        }
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i32)
            .unwrap_or(0)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_raw(raw: Vec<RawProperty>) -> Self {
        let mut props = Self::default();
        for p in raw {
            let text = match p.value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            props.insert(p.name, text);
        }
        props
    }
}

/// A resolved, non-empty map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Index into `TmxMap::tilesets`.
    pub tileset: usize,
    /// Tile id local to its tileset.
    pub id: u32,
    pub flipped_horizontally: bool,
    pub flipped_vertically: bool,
    pub flipped_diagonally: bool,
}

#[derive(Debug, Clone)]
pub struct TileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub properties: Properties,
    cells: Vec<Option<Tile>>,
}

impl TileLayer {
    /// Cell at tile coordinate `(x, y)`; `None` when empty or out of range.
    pub fn tile(&self, x: u32, y: u32) -> Option<Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .flatten()
    }

    /// Number of non-empty cells.
    pub fn tile_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// A placed object. Only objects carrying a gid are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    /// Global tile id with the flip bits stripped.
    pub gid: Option<u32>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct ObjectGroup {
    pub name: String,
    pub properties: Properties,
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone)]
pub struct Tileset {
    pub first_gid: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub image: Option<String>,
    pub tile_count: Option<u32>,
    pub properties: Properties,
    tile_properties: BTreeMap<u32, Properties>,
}

impl Tileset {
    /// Properties of the tile with local id `id`, if any were authored.
    pub fn tile_properties(&self, id: u32) -> Option<&Properties> {
        self.tile_properties.get(&id)
    }

    /// File name of the tileset image without directory or extension.
    pub fn image_stem(&self) -> Option<&str> {
        let image = self.image.as_deref()?;
        let file = image.rsplit(['/', '\\']).next()?;
        let stem = match file.rfind('.') {
            Some(0) | None => file,
            Some(dot) => &file[..dot],
        };
        (!stem.is_empty()).then_some(stem)
    }
}

/// A loaded Tiled map.
#[derive(Debug, Clone)]
pub struct TmxMap {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    pub orientation: Orientation,
    pub properties: Properties,
    pub layers: Vec<TileLayer>,
    pub object_groups: Vec<ObjectGroup>,
    pub tilesets: Vec<Tileset>,
}

impl TmxMap {
    /// Parse a map from Tiled's JSON map format.
    pub fn from_json(json: &str) -> Result<Self, TmxError> {
        let raw: RawMap = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Load a map file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TmxError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }

    /// Tileset owning `gid`: the one with the greatest `first_gid <= gid`.
    pub fn find_tileset(&self, gid: u32) -> Option<(usize, &Tileset)> {
        let gid = gid & GID_MASK;
        if gid == 0 {
            return None;
        }
        self.tilesets
            .iter()
            .enumerate()
            .filter(|(_, ts)| ts.first_gid <= gid)
            .max_by_key(|(_, ts)| ts.first_gid)
    }

    pub fn layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Width of the whole map in pixels.
    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_width as f32
    }

    /// Height of the whole map in pixels.
    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_height as f32
    }

    fn from_raw(raw: RawMap) -> Result<Self, TmxError> {
        if raw.infinite {
            return Err(TmxError::InfiniteMap);
        }
        if raw.tilewidth == 0 || raw.tileheight == 0 {
            return Err(TmxError::ZeroTileSize);
        }
        let orientation = match raw.orientation.as_str() {
            "orthogonal" => Orientation::Orthogonal,
            "isometric" => Orientation::Isometric,
            other => return Err(TmxError::UnsupportedOrientation(other.to_string())),
        };
        if cell_count(raw.width, raw.height).is_none() {
            return Err(TmxError::MapTooLarge {
                width: raw.width,
                height: raw.height,
            });
        }

        let mut tilesets = Vec::with_capacity(raw.tilesets.len());
        for ts in raw.tilesets {
            if ts.source.is_some() {
                return Err(TmxError::ExternalTileset(ts.firstgid));
            }
            let (Some(tile_width), Some(tile_height)) = (ts.tilewidth, ts.tileheight) else {
                return Err(TmxError::TilesetMissingSize(ts.name));
            };
            let tile_properties = ts
                .tiles
                .into_iter()
                .map(|t| (t.id, Properties::from_raw(t.properties)))
                .collect();
            tilesets.push(Tileset {
                first_gid: ts.firstgid,
                name: ts.name,
                tile_width,
                tile_height,
                image: ts.image,
                tile_count: ts.tilecount,
                properties: Properties::from_raw(ts.properties),
                tile_properties,
            });
        }

        let mut map = Self {
            width: raw.width,
            height: raw.height,
            tile_width: raw.tilewidth,
            tile_height: raw.tileheight,
            orientation,
            properties: Properties::from_raw(raw.properties),
            layers: Vec::new(),
            object_groups: Vec::new(),
            tilesets,
        };

        let mut pending = raw.layers;
        pending.reverse();
        while let Some(layer) = pending.pop() {
            match layer {
                RawLayer::TileLayer {
                    name,
                    width,
                    height,
                    data,
                    encoding,
                    properties,
                } => {
                    let layer = map.resolve_layer(name, width, height, data, encoding, properties)?;
                    map.layers.push(layer);
                }
                RawLayer::ObjectGroup {
                    name,
                    objects,
                    properties,
                } => {
                    let objects = objects
                        .into_iter()
                        .map(|o| MapObject {
                            id: o.id,
                            name: o.name,
                            gid: o.gid.map(|g| g & GID_MASK).filter(|g| *g != 0),
                            x: o.x,
                            y: o.y,
                            width: o.width,
                            height: o.height,
                        })
                        .collect();
                    map.object_groups.push(ObjectGroup {
                        name,
                        properties: Properties::from_raw(properties),
                        objects,
                    });
                }
                // Children keep their document order.
                RawLayer::Group { layers, .. } => pending.extend(layers.into_iter().rev()),
                RawLayer::ImageLayer { name } => {
                    tracing::debug!(layer = %name, "image layers are not drawn by map sprites");
                }
            }
        }

        Ok(map)
    }

    fn resolve_layer(
        &self,
        name: String,
        width: u32,
        height: u32,
        data: Option<RawData>,
        encoding: Option<String>,
        properties: Vec<RawProperty>,
    ) -> Result<TileLayer, TmxError> {
        if (width, height) != (self.width, self.height) {
            return Err(TmxError::LayerDimensions {
                layer: name,
                width,
                height,
                map_width: self.width,
                map_height: self.height,
            });
        }
        if let Some(enc) = encoding.filter(|e| e != "csv") {
            return Err(TmxError::UnsupportedEncoding {
                layer: name,
                encoding: enc,
            });
        }
        let gids = match data {
            Some(RawData::Gids(gids)) => gids,
            Some(RawData::Encoded(_)) => {
                return Err(TmxError::UnsupportedEncoding {
                    layer: name,
                    encoding: "base64".into(),
                });
            }
            None => Vec::new(),
        };
        let expected = cell_count(width, height).ok_or(TmxError::MapTooLarge { width, height })?;
        if gids.len() != expected {
            return Err(TmxError::LayerSize {
                layer: name,
                expected,
                actual: gids.len(),
            });
        }

        let mut cells = Vec::with_capacity(expected);
        for raw_gid in gids {
            let gid = raw_gid & GID_MASK;
            if gid == 0 {
                cells.push(None);
                continue;
            }
            let (tileset, ts) = self
                .find_tileset(gid)
                .ok_or_else(|| TmxError::UnknownGid {
                    layer: name.clone(),
                    gid,
                })?;
            cells.push(Some(Tile {
                tileset,
                id: gid - ts.first_gid,
                flipped_horizontally: raw_gid & FLIPPED_HORIZONTALLY != 0,
                flipped_vertically: raw_gid & FLIPPED_VERTICALLY != 0,
                flipped_diagonally: raw_gid & FLIPPED_DIAGONALLY != 0,
            }));
        }

        Ok(TileLayer {
            name,
            width,
            height,
            properties: Properties::from_raw(properties),
            cells,
        })
    }
}

/// Number of cells in a `width` x `height` grid, if it is addressable.
fn cell_count(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

// --- Tiled JSON document shapes ---

#[derive(Deserialize)]
struct RawMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default = "default_orientation")]
    orientation: String,
    #[serde(default)]
    infinite: bool,
    #[serde(default)]
    layers: Vec<RawLayer>,
    #[serde(default)]
    tilesets: Vec<RawTileset>,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

fn default_orientation() -> String {
    "orthogonal".into()
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawLayer {
    #[serde(rename = "tilelayer")]
    TileLayer {
        #[serde(default)]
        name: String,
        width: u32,
        height: u32,
        #[serde(default)]
        data: Option<RawData>,
        #[serde(default)]
        encoding: Option<String>,
        #[serde(default)]
        properties: Vec<RawProperty>,
    },
    #[serde(rename = "objectgroup")]
    ObjectGroup {
        #[serde(default)]
        name: String,
        #[serde(default)]
        objects: Vec<RawObject>,
        #[serde(default)]
        properties: Vec<RawProperty>,
    },
    #[serde(rename = "group")]
    Group {
        #[serde(default)]
        layers: Vec<RawLayer>,
    },
    #[serde(rename = "imagelayer")]
    ImageLayer {
        #[serde(default)]
        name: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawData {
    Gids(Vec<u32>),
    Encoded(#[allow(dead_code)] String),
}

#[derive(Deserialize)]
struct RawObject {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    gid: Option<u32>,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
}

#[derive(Deserialize)]
struct RawTileset {
    firstgid: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    tilewidth: Option<u32>,
    #[serde(default)]
    tileheight: Option<u32>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    tilecount: Option<u32>,
    #[serde(default)]
    properties: Vec<RawProperty>,
    #[serde(default)]
    tiles: Vec<RawTile>,
}

#[derive(Deserialize)]
struct RawTile {
    id: u32,
    #[serde(default)]
    properties: Vec<RawProperty>,
}

#[derive(Deserialize)]
struct RawProperty {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

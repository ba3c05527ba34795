//! Asset database: modules of named assets addressed as `Module:name`.
//!
//! A module is a directory holding a `module.json` manifest. Map assets are
//! parsed when the module loads; image and animation assets are declarations
//! the renderer resolves by reference, never by raw file path.
//!
//! # Invariants
//! - An asset reference is registered at most once.
//! - Every animation points at a registered image and only at frames it has.

use sandbox_common::{AssetRef, CommonError};
use sandbox_tmx::{TmxError, TmxMap};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of a module manifest inside its directory.
pub const MANIFEST_FILE: &str = "module.json";

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map asset {asset}: {source}")]
    Tmx {
        asset: AssetRef,
        #[source]
        source: TmxError,
    },
    #[error("asset not found: {0}")]
    NotFound(AssetRef),
    #[error("asset {asset} is not a {expected} asset")]
    WrongKind {
        asset: AssetRef,
        expected: &'static str,
    },
    #[error("asset already registered: {0}")]
    DuplicateAsset(AssetRef),
    #[error("animation {asset}: {reason}")]
    InvalidAnimation { asset: AssetRef, reason: String },
    #[error("{}: not valid UTF-8", path.display())]
    NotUtf8 {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error(transparent)]
    Common(#[from] CommonError),
}

/// A parsed Tiled map.
#[derive(Debug, Clone)]
pub struct MapAsset {
    /// Source file, when the map was loaded from disk.
    pub path: Option<PathBuf>,
    pub map: Arc<TmxMap>,
    /// Content hash of the map document.
    pub fingerprint: u64,
}

/// A sprite sheet split into equally sized cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub file: String,
    pub cell_width: u32,
    pub cell_height: u32,
    pub cell_count: u32,
}

/// A frame sequence over an image asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationAsset {
    pub image: AssetRef,
    pub frames: Vec<u32>,
    /// Seconds for one full cycle.
    pub time: f32,
}

#[derive(Debug, Clone)]
pub enum Asset {
    Map(MapAsset),
    Image(ImageAsset),
    Animation(AnimationAsset),
}

impl Asset {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Map(_) => "map",
            Self::Image(_) => "image",
            Self::Animation(_) => "animation",
        }
    }
}

/// On-disk module manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub module: String,
    #[serde(default)]
    pub assets: Vec<AssetDecl>,
}

/// One asset declaration in a module manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetDecl {
    TmxMap {
        name: String,
        file: String,
    },
    Image {
        name: String,
        file: String,
        cell_width: u32,
        cell_height: u32,
        #[serde(default = "default_cell_count")]
        cell_count: u32,
    },
    Animation {
        name: String,
        /// `Module:name`, or a bare name inside the declaring module.
        image: String,
        frames: Vec<u32>,
        #[serde(default = "default_animation_time")]
        time: f32,
    },
}

fn default_cell_count() -> u32 {
    1
}

fn default_animation_time() -> f32 {
    1.0
}

/// Registry of every loaded asset, keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: BTreeMap<AssetRef, Asset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every asset declared by `dir/module.json`.
    ///
    /// Returns the references registered, in declaration order. The load is
    /// all or nothing: on error the store is left as it was.
    pub fn load_module(&mut self, dir: impl AsRef<Path>) -> Result<Vec<AssetRef>, AssetError> {
        let mut staged = self.clone();
        let registered = staged.stage_module(dir.as_ref())?;
        *self = staged;
        Ok(registered)
    }

    fn stage_module(&mut self, dir: &Path) -> Result<Vec<AssetRef>, AssetError> {
        let _span = tracing::info_span!("load_module", dir = %dir.display()).entered();
        let manifest: ModuleManifest =
            serde_json::from_str(&std::fs::read_to_string(dir.join(MANIFEST_FILE))?)?;

        let mut registered = Vec::with_capacity(manifest.assets.len());
        let mut animations = Vec::new();
        for decl in manifest.assets {
            match decl {
                AssetDecl::TmxMap { name, file } => {
                    let asset = AssetRef::new(&manifest.module, &name)?;
                    self.ensure_vacant(&asset)?;
                    let path = dir.join(&file);
                    let map = load_map_asset(&asset, &path)?;
                    self.assets.insert(asset.clone(), Asset::Map(map));
                    registered.push(asset);
                }
                AssetDecl::Image {
                    name,
                    file,
                    cell_width,
                    cell_height,
                    cell_count,
                } => {
                    let asset = AssetRef::new(&manifest.module, &name)?;
                    self.register_image(
                        asset.clone(),
                        ImageAsset {
                            file,
                            cell_width,
                            cell_height,
                            cell_count,
                        },
                    )?;
                    registered.push(asset);
                }
                AssetDecl::Animation {
                    name,
                    image,
                    frames,
                    time,
                } => {
                    let asset = AssetRef::new(&manifest.module, &name)?;
                    let image = if image.contains(':') {
                        AssetRef::parse(&image)?
                    } else {
                        AssetRef::new(&manifest.module, &image)?
                    };
                    // Images may be declared after the animations using them.
                    animations.push((asset.clone(), AnimationAsset { image, frames, time }));
                    registered.push(asset);
                }
            }
        }
        for (asset, animation) in animations {
            self.register_animation(asset, animation)?;
        }

        tracing::info!(module = %manifest.module, assets = registered.len(), "module loaded");
        Ok(registered)
    }

    /// Register an already parsed map.
    pub fn register_map(&mut self, asset: AssetRef, map: TmxMap) -> Result<(), AssetError> {
        self.ensure_vacant(&asset)?;
        tracing::debug!(%asset, "map registered");
        self.assets.insert(
            asset,
            Asset::Map(MapAsset {
                path: None,
                map: Arc::new(map),
                fingerprint: 0,
            }),
        );
        Ok(())
    }

    pub fn register_image(&mut self, asset: AssetRef, image: ImageAsset) -> Result<(), AssetError> {
        self.ensure_vacant(&asset)?;
        tracing::debug!(%asset, cells = image.cell_count, "image registered");
        self.assets.insert(asset, Asset::Image(image));
        Ok(())
    }

    /// Register an animation. Its image must already be registered.
    pub fn register_animation(
        &mut self,
        asset: AssetRef,
        animation: AnimationAsset,
    ) -> Result<(), AssetError> {
        self.ensure_vacant(&asset)?;
        let image = self.get_image(&animation.image).ok_or_else(|| {
            AssetError::InvalidAnimation {
                asset: asset.clone(),
                reason: format!("image {} is not registered", animation.image),
            }
        })?;
        if animation.frames.is_empty() {
            return Err(AssetError::InvalidAnimation {
                asset,
                reason: "no frames".into(),
            });
        }
        if let Some(frame) = animation.frames.iter().find(|f| **f >= image.cell_count) {
            return Err(AssetError::InvalidAnimation {
                reason: format!("frame {frame} exceeds {} cells of {}", image.cell_count, animation.image),
                asset,
            });
        }
        if !(animation.time.is_finite() && animation.time > 0.0) {
            return Err(AssetError::InvalidAnimation {
                asset,
                reason: format!("invalid cycle time {}", animation.time),
            });
        }
        tracing::debug!(%asset, frames = animation.frames.len(), "animation registered");
        self.assets.insert(asset, Asset::Animation(animation));
        Ok(())
    }

    pub fn get(&self, asset: &AssetRef) -> Option<&Asset> {
        self.assets.get(asset)
    }

    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.assets.contains_key(asset)
    }

    /// Parsed map for `asset`.
    pub fn get_map(&self, asset: &AssetRef) -> Result<Arc<TmxMap>, AssetError> {
        match self.assets.get(asset) {
            Some(Asset::Map(m)) => Ok(Arc::clone(&m.map)),
            Some(_) => Err(AssetError::WrongKind {
                asset: asset.clone(),
                expected: "map",
            }),
            None => Err(AssetError::NotFound(asset.clone())),
        }
    }

    pub fn get_image(&self, asset: &AssetRef) -> Option<&ImageAsset> {
        match self.assets.get(asset) {
            Some(Asset::Image(i)) => Some(i),
            _ => None,
        }
    }

    pub fn get_animation(&self, asset: &AssetRef) -> Option<&AnimationAsset> {
        match self.assets.get(asset) {
            Some(Asset::Animation(a)) => Some(a),
            _ => None,
        }
    }

    /// Every asset whose name part equals `name`, across all modules.
    pub fn find_asset_name(&self, name: &str) -> Vec<AssetRef> {
        self.assets
            .keys()
            .filter(|r| r.name() == name)
            .cloned()
            .collect()
    }

    /// Re-read a map from its source file. Returns whether the content changed.
    pub fn reload_map(&mut self, asset: &AssetRef) -> Result<bool, AssetError> {
        let Some(Asset::Map(current)) = self.assets.get(asset) else {
            return Err(match self.assets.get(asset) {
                Some(_) => AssetError::WrongKind {
                    asset: asset.clone(),
                    expected: "map",
                },
                None => AssetError::NotFound(asset.clone()),
            });
        };
        let Some(path) = current.path.clone() else {
            return Ok(false);
        };
        let data = std::fs::read(&path)?;
        if fingerprint(&data) == current.fingerprint {
            tracing::debug!(%asset, "map unchanged");
            return Ok(false);
        }
        let reloaded = load_map_asset(asset, &path)?;
        tracing::info!(%asset, "map reloaded");
        self.assets.insert(asset.clone(), Asset::Map(reloaded));
        Ok(true)
    }

    /// All registered references in sorted order.
    pub fn refs(&self) -> impl Iterator<Item = &AssetRef> {
        self.assets.keys()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn ensure_vacant(&self, asset: &AssetRef) -> Result<(), AssetError> {
        if self.assets.contains_key(asset) {
            return Err(AssetError::DuplicateAsset(asset.clone()));
        }
        Ok(())
    }
}

fn load_map_asset(asset: &AssetRef, path: &Path) -> Result<MapAsset, AssetError> {
    let data = std::fs::read(path)?;
    let fingerprint = fingerprint(&data);
    let text = String::from_utf8(data).map_err(|source| AssetError::NotUtf8 {
        path: path.to_path_buf(),
        source,
    })?;
    let map = TmxMap::from_json(&text).map_err(|source| AssetError::Tmx {
        asset: asset.clone(),
        source,
    })?;
    Ok(MapAsset {
        path: Some(path.to_path_buf()),
        map: Arc::new(map),
        fingerprint,
    })
}

/// First eight bytes of the SHA-256 digest of `data`.
fn fingerprint(data: &[u8]) -> u64 {
    let digest = Sha256::digest(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

pub fn crate_info() -> &'static str {
    "sandbox-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MAP: &str = r#"{"width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
        "layers": [{"type": "tilelayer", "name": "Ground", "width": 2, "height": 1, "data": [1, 2]}],
        "tilesets": [{"firstgid": 1, "name": "ground", "tilewidth": 16, "tileheight": 16,
                      "image": "ground.png", "tilecount": 4}]}"#;

    fn r(s: &str) -> AssetRef {
        AssetRef::parse(s).unwrap()
    }

    fn write_module(dir: &Path) {
        fs::write(dir.join("town.tmj"), MAP).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            r#"{"module": "ToyAssets", "assets": [
                {"type": "tmx_map", "name": "town_map", "file": "town.tmj"},
                {"type": "animation", "name": "Walk", "image": "knight", "frames": [0, 1, 2], "time": 0.5},
                {"type": "image", "name": "knight", "file": "knight.png",
                 "cell_width": 32, "cell_height": 32, "cell_count": 4},
                {"type": "image", "name": "ground", "file": "ground.png",
                 "cell_width": 16, "cell_height": 16, "cell_count": 4}
            ]}"#,
        )
        .unwrap();
    }

    fn knight() -> ImageAsset {
        ImageAsset {
            file: "knight.png".into(),
            cell_width: 32,
            cell_height: 32,
            cell_count: 4,
        }
    }

    #[test]
    fn load_module_registers_everything() {
        let tmp = tempfile::tempdir().unwrap();
        write_module(tmp.path());

        let mut store = AssetStore::new();
        let refs = store.load_module(tmp.path()).unwrap();
        assert_eq!(refs.len(), 4);
        assert_eq!(store.len(), 4);

        let map = store.get_map(&r("ToyAssets:town_map")).unwrap();
        assert_eq!(map.layers[0].tile_count(), 2);

        let walk = store.get_animation(&r("ToyAssets:Walk")).unwrap();
        assert_eq!(walk.image, r("ToyAssets:knight"));
        assert_eq!(walk.frames, vec![0, 1, 2]);
    }

    #[test]
    fn loading_a_module_twice_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_module(tmp.path());
        let mut store = AssetStore::new();
        store.load_module(tmp.path()).unwrap();
        assert!(matches!(
            store.load_module(tmp.path()),
            Err(AssetError::DuplicateAsset(_))
        ));
    }

    #[test]
    fn get_map_reports_missing_and_wrong_kind() {
        let mut store = AssetStore::new();
        store.register_image(r("A:knight"), knight()).unwrap();
        assert!(matches!(
            store.get_map(&r("A:nothing")),
            Err(AssetError::NotFound(_))
        ));
        assert!(matches!(
            store.get_map(&r("A:knight")),
            Err(AssetError::WrongKind { expected: "map", .. })
        ));
    }

    #[test]
    fn find_asset_name_spans_modules() {
        let mut store = AssetStore::new();
        store.register_image(r("B:ground"), knight()).unwrap();
        store.register_image(r("A:ground"), knight()).unwrap();
        store.register_image(r("A:other"), knight()).unwrap();
        assert_eq!(
            store.find_asset_name("ground"),
            vec![r("A:ground"), r("B:ground")]
        );
        assert!(store.find_asset_name("missing").is_empty());
    }

    #[test]
    fn animation_validation() {
        let mut store = AssetStore::new();
        let anim = |frames: Vec<u32>| AnimationAsset {
            image: r("A:knight"),
            frames,
            time: 1.0,
        };
        assert!(matches!(
            store.register_animation(r("A:walk"), anim(vec![0])),
            Err(AssetError::InvalidAnimation { .. })
        ));

        store.register_image(r("A:knight"), knight()).unwrap();
        assert!(store.register_animation(r("A:walk"), anim(vec![])).is_err());
        assert!(store.register_animation(r("A:walk"), anim(vec![0, 4])).is_err());
        store.register_animation(r("A:walk"), anim(vec![0, 3])).unwrap();
        assert!(store.get_animation(&r("A:walk")).is_some());
    }

    #[test]
    fn reload_map_detects_changes() {
        let tmp = tempfile::tempdir().unwrap();
        write_module(tmp.path());
        let mut store = AssetStore::new();
        store.load_module(tmp.path()).unwrap();
        let town = r("ToyAssets:town_map");

        assert!(!store.reload_map(&town).unwrap());

        fs::write(tmp.path().join("town.tmj"), MAP.replace("[1, 2]", "[2, 0]")).unwrap();
        assert!(store.reload_map(&town).unwrap());
        assert_eq!(store.get_map(&town).unwrap().layers[0].tile_count(), 1);

        assert!(matches!(
            store.reload_map(&r("ToyAssets:knight")),
            Err(AssetError::WrongKind { .. })
        ));
    }

    #[test]
    fn broken_map_names_the_asset() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("bad.tmj"), r#"{"width": 1}"#).unwrap();
        fs::write(
            tmp.path().join(MANIFEST_FILE),
            r#"{"module": "M", "assets": [{"type": "tmx_map", "name": "bad", "file": "bad.tmj"}]}"#,
        )
        .unwrap();
        let err = AssetStore::new().load_module(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("M:bad"));
    }

    #[test]
    fn failed_load_leaves_store_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest = |assets: &str| format!(r#"{{"module": "M", "assets": [{assets}]}}"#);
        let image = r#"{"type": "image", "name": "a", "file": "a.png", "cell_width": 8, "cell_height": 8}"#;
        fs::write(tmp.path().join(MANIFEST_FILE), manifest(&format!("{image}, {image}"))).unwrap();

        let mut store = AssetStore::new();
        store.register_image(r("Other:knight"), knight()).unwrap();
        assert!(matches!(
            store.load_module(tmp.path()),
            Err(AssetError::DuplicateAsset(_))
        ));
        assert!(!store.contains(&r("M:a")));
        assert_eq!(store.len(), 1);

        // A fixed manifest loads cleanly on retry.
        fs::write(tmp.path().join(MANIFEST_FILE), manifest(image)).unwrap();
        assert_eq!(store.load_module(tmp.path()).unwrap(), vec![r("M:a")]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn bad_animation_rolls_back_earlier_entries() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("town.tmj"), MAP).unwrap();
        fs::write(
            tmp.path().join(MANIFEST_FILE),
            r#"{"module": "M", "assets": [
                {"type": "tmx_map", "name": "town", "file": "town.tmj"},
                {"type": "animation", "name": "walk", "image": "missing", "frames": [0]}
            ]}"#,
        )
        .unwrap();
        let mut store = AssetStore::new();
        assert!(matches!(
            store.load_module(tmp.path()),
            Err(AssetError::InvalidAnimation { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn map_files_must_be_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let mut bytes = MAP.as_bytes().to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        fs::write(tmp.path().join("town.tmj"), bytes).unwrap();
        fs::write(
            tmp.path().join(MANIFEST_FILE),
            r#"{"module": "M", "assets": [{"type": "tmx_map", "name": "town", "file": "town.tmj"}]}"#,
        )
        .unwrap();
        let mut store = AssetStore::new();
        assert!(matches!(
            store.load_module(tmp.path()),
            Err(AssetError::NotUtf8 { .. })
        ));
        assert!(store.is_empty());
    }
}

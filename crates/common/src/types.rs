use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors from constructing shared value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommonError {
    #[error("invalid asset reference {0:?}: expected \"Module:name\"")]
    InvalidAssetRef(String),
    #[error("scene layer {0} out of range (0..={max})", max = SceneLayer::MAX)]
    LayerOutOfRange(u32),
}

/// Serial identifier of an object inside a scene.
///
/// Ids are allocated by the owning scene and never reused within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to an asset in the form `Module:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetRef {
    module: String,
    name: String,
}

impl AssetRef {
    /// Parse `Module:name`. Both parts must be non-empty and free of
    /// surrounding whitespace, so `Display` gives back the parsed text.
    pub fn parse(s: &str) -> Result<Self, CommonError> {
        let (module, name) = s
            .split_once(':')
            .ok_or_else(|| CommonError::InvalidAssetRef(s.to_string()))?;
        let padded = |part: &str| part.trim() != part;
        if module.is_empty()
            || name.is_empty()
            || name.contains(':')
            || padded(module)
            || padded(name)
        {
            return Err(CommonError::InvalidAssetRef(s.to_string()));
        }
        Ok(Self {
            module: module.to_string(),
            name: name.to_string(),
        })
    }

    /// Build a reference from its two parts.
    pub fn new(module: &str, name: &str) -> Result<Self, CommonError> {
        Self::parse(&format!("{module}:{name}"))
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

impl FromStr for AssetRef {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetRef {
    type Error = CommonError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AssetRef> for String {
    fn from(r: AssetRef) -> Self {
        r.to_string()
    }
}

/// Render layer index. Layer 0 is drawn in front, layer 31 at the back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SceneLayer(u8);

impl SceneLayer {
    pub const MAX: u32 = 31;
    pub const COUNT: usize = 32;

    pub fn new(layer: u32) -> Result<Self, CommonError> {
        if layer > Self::MAX {
            return Err(CommonError::LayerOutOfRange(layer));
        }
        Ok(Self(layer as u8))
    }

    /// Clamp any integer into the valid layer range.
    pub fn clamped(layer: i64) -> Self {
        Self(layer.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn index(self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<u32> for SceneLayer {
    type Error = CommonError;

    fn try_from(layer: u32) -> Result<Self, Self::Error> {
        Self::new(layer)
    }
}

impl From<SceneLayer> for u32 {
    fn from(layer: SceneLayer) -> Self {
        layer.index()
    }
}

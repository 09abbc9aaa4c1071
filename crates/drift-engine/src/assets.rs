//! Asset catalog: which textures and sounds exist, and texture dimensions.
//!
//! Decoding and playback belong to the platform layer. The kernel only needs
//! to know whether a key resolves and how large a texture is, so sprites can
//! keep their aspect ratio and fall back to a flat color when a key is
//! missing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::DriftError;

/// Read-only asset lookup.
pub trait AssetCatalog {
    /// Pixel dimensions of a texture, or `None` if the key is unknown.
    fn texture_size(&self, key: &str) -> Option<(u32, u32)>;

    fn has_sound(&self, key: &str) -> bool;

    fn has_texture(&self, key: &str) -> bool {
        self.texture_size(key).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
}

/// JSON-backed asset manifest.
///
/// ```json
/// { "textures": { "rocket": { "width": 128, "height": 64 } }, "sounds": ["explosion"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub textures: BTreeMap<String, TextureInfo>,
    pub sounds: BTreeSet<String>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriftError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DriftError::Io {
            action: "read asset manifest",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DriftError::Parse {
            what: "asset manifest",
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_texture(mut self, key: impl Into<String>, width: u32, height: u32) -> Self {
        self.textures.insert(key.into(), TextureInfo { width, height });
        self
    }

    pub fn with_sound(mut self, key: impl Into<String>) -> Self {
        self.sounds.insert(key.into());
        self
    }
}

impl AssetCatalog for AssetManifest {
    fn texture_size(&self, key: &str) -> Option<(u32, u32)> {
        self.textures.get(key).map(|t| (t.width, t.height))
    }

    fn has_sound(&self, key: &str) -> bool {
        self.sounds.contains(key)
    }
}

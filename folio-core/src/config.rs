//! Site configuration.
//!
//! Everything the page treats as fixed at build time lives here: scene
//! assets per section, the turntable prop, gallery collections and the
//! featured playlists. Defaults are built in; a TOML document overrides
//! only the tables and keys it names.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::embed::EmbedStyle;
use crate::error::ConfigError;
use crate::gallery::GalleryConfig;
use crate::playlist::{default_playlists, Playlist};
use crate::scene_map::{SceneAssetRef, SceneCatalog};
use crate::section::DEFAULT_LOOKAHEAD;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Distance below the scroll offset at which sections are probed, px
    pub lookahead: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    /// Multiplier on the normalized asset size
    pub scale: f32,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self { scale: 1.5 }
    }
}

/// The music section's own spinning prop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurntableConfig {
    pub asset: SceneAssetRef,
    pub scale: f32,
}

impl Default for TurntableConfig {
    fn default() -> Self {
        Self {
            asset: SceneAssetRef::new("/models/vinyl.glb"),
            scale: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub playlists: Vec<Playlist>,
    pub embed: EmbedStyle,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            playlists: default_playlists(),
            embed: EmbedStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub scroll: ScrollConfig,
    pub scenes: SceneCatalog,
    pub backdrop: BackdropConfig,
    pub turntable: TurntableConfig,
    pub gallery: GalleryConfig,
    pub audio: AudioConfig,
}

impl SiteConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scroll.lookahead.is_finite() {
            return Err(ConfigError::Invalid("scroll.lookahead must be finite".into()));
        }
        for (name, scale) in [("backdrop", self.backdrop.scale), ("turntable", self.turntable.scale)] {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ConfigError::Invalid(format!("{name}.scale must be positive")));
            }
        }

        let mut collection_ids = HashSet::new();
        for collection in &self.gallery.collections {
            if !collection_ids.insert(collection.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate collection id {}", collection.id)));
            }
            let mut item_ids = HashSet::new();
            for item in &collection.items {
                if !item_ids.insert(item.id.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "duplicate item id {} in collection {}",
                        item.id, collection.id
                    )));
                }
            }
        }

        for playlist in &self.audio.playlists {
            if playlist.embed_uri().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "playlist {} has no usable link: {}",
                    playlist.name, playlist.share_url
                )));
            }
        }
        Ok(())
    }
}

/// Mapping from the active page section to the backdrop scene asset
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::section::Section;

/// Location of a scene asset, or none
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SceneAssetRef(Option<String>);

impl SceneAssetRef {
    /// Empty and whitespace-only locations normalize to none.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if uri.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(uri))
        }
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn uri(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<String> for SceneAssetRef {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

impl From<SceneAssetRef> for String {
    fn from(asset: SceneAssetRef) -> Self {
        asset.0.unwrap_or_default()
    }
}

impl fmt::Display for SceneAssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri().unwrap_or("<none>"))
    }
}

/// Backdrop asset per section. Music has no entry: that section shows its
/// own turntable prop instead of the backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneCatalog {
    pub home: SceneAssetRef,
    pub portfolio: SceneAssetRef,
    pub about: SceneAssetRef,
    pub contact: SceneAssetRef,
}

impl Default for SceneCatalog {
    fn default() -> Self {
        Self {
            home: SceneAssetRef::new("/models/untitled.glb"),
            portfolio: SceneAssetRef::new("/assets/models/nikon.gltf"),
            about: SceneAssetRef::new("/models/untitled.glb"),
            contact: SceneAssetRef::new("/models/untitled.glb"),
        }
    }
}

pub fn scene_for(section: Section, catalog: &SceneCatalog) -> SceneAssetRef {
    match section {
        Section::Home => catalog.home.clone(),
        Section::Portfolio => catalog.portfolio.clone(),
        Section::Music => SceneAssetRef::none(),
        Section::About => catalog.about.clone(),
        Section::Contact => catalog.contact.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_total_and_deterministic() {
        let catalog = SceneCatalog::default();
        for section in Section::ALL {
            assert_eq!(scene_for(section, &catalog), scene_for(section, &catalog));
        }
    }

    #[test]
    fn test_music_maps_to_none() {
        let catalog = SceneCatalog::default();
        assert!(scene_for(Section::Music, &catalog).is_none());
        assert!(!scene_for(Section::Home, &catalog).is_none());
    }

    #[test]
    fn test_default_assets() {
        let catalog = SceneCatalog::default();
        assert_eq!(scene_for(Section::Portfolio, &catalog).uri(), Some("/assets/models/nikon.gltf"));
        assert_eq!(scene_for(Section::Contact, &catalog), scene_for(Section::Home, &catalog));
    }

    #[test]
    fn test_blank_uri_is_none() {
        assert!(SceneAssetRef::new("  ").is_none());
        assert_eq!(String::from(SceneAssetRef::none()), "");
    }
}

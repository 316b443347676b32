/// Scene assets read from a local site root
use folio_core::asset;
use folio_core::{AssetError, Mesh};
use std::fs;
use std::path::{Path, PathBuf};

pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a site-absolute URI such as `/models/vinyl.glb` into the root.
    pub fn path_for(&self, uri: &str) -> PathBuf {
        let relative = uri.split(['?', '#']).next().unwrap_or(uri).trim_start_matches('/');
        self.root.join(relative)
    }

    fn read(&self, uri: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.path_for(uri);
        fs::read(&path).map_err(|e| AssetError::Fetch {
            uri: uri.to_string(),
            reason: format!("{}: {e}", path.display()),
        })
    }

    pub fn load(&self, uri: &str) -> Result<Mesh, AssetError> {
        let bytes = self.read(uri)?;
        asset::decode(uri, &bytes, |reference| self.read(&asset::resolve_relative(uri, reference)))
    }
}

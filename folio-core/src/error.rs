/// Error types for the folio core
use serde::Serialize;
use thiserror::Error;

/// A scene asset could not be fetched or decoded
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to fetch {uri}: {reason}")]
    Fetch { uri: String, reason: String },
    #[error("invalid STL data: {0}")]
    Stl(String),
    #[error("invalid glTF data: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("glTF buffer {0} could not be resolved")]
    MissingBuffer(String),
    #[error("invalid data URI: {0}")]
    DataUri(String),
    #[error("asset contains no triangle geometry")]
    EmptyGeometry,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GalleryError {
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("no visible item {0} in the open collection")]
    UnknownItem(String),
}

/// Failures of the third-party audio embed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum EmbedError {
    #[error("embed script failed to load: {0}")]
    ScriptLoad(String),
    #[error("embed failed to initialize: {0}")]
    Initialization(String),
    #[error("playback control failed: {0}")]
    Control(String),
    #[error("embed container unavailable: {0}")]
    Host(String),
}

impl EmbedError {
    /// Control failures are shown briefly and cleared by the next successful call.
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbedError::Control(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse site configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid site configuration: {0}")]
    Invalid(String),
}

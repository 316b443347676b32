//! Fetches scene assets over HTTP and decodes them with the core.

use std::collections::HashMap;

use folio_core::asset;
use folio_core::{AssetError, Mesh};
use gloo::net::http::Request;

async fn fetch_bytes(uri: &str) -> Result<Vec<u8>, AssetError> {
    let fetch_error = |reason: String| AssetError::Fetch {
        uri: uri.to_string(),
        reason,
    };
    let response = Request::get(uri)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;
    if !response.ok() {
        return Err(fetch_error(format!("HTTP {}", response.status())));
    }
    response.binary().await.map_err(|e| fetch_error(e.to_string()))
}

/// Fetch `uri` and any external glTF buffers it names, then decode.
pub async fn load_mesh(uri: &str) -> Result<Mesh, AssetError> {
    let bytes = fetch_bytes(uri).await?;

    let mut buffers = HashMap::new();
    for reference in asset::external_buffers(uri, &bytes)? {
        let data = fetch_bytes(&asset::resolve_relative(uri, &reference)).await?;
        buffers.insert(reference, data);
    }

    asset::decode(uri, &bytes, |reference| {
        buffers
            .remove(reference)
            .ok_or_else(|| AssetError::MissingBuffer(reference.to_string()))
    })
}

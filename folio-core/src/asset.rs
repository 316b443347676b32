//! Scene asset decoding: glTF 2.0 (`.gltf` / `.glb`) and STL.
//!
//! Decoding is synchronous and platform-free. Fetching bytes is the
//! caller's job; glTF files that reference external buffers get them
//! through a resolver so the web front end can prefetch them and the
//! terminal preview can read them from disk.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use gltf::buffer::Source;
use gltf::mesh::Mode;
use nalgebra::{Matrix4, Point3};

use crate::error::AssetError;
use crate::geometry::{Mesh, Triangle};
use crate::stl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    Gltf,
    Stl,
}

impl AssetFormat {
    pub fn from_uri(uri: &str) -> Result<Self, AssetError> {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "gltf" | "glb" => Ok(AssetFormat::Gltf),
            "stl" => Ok(AssetFormat::Stl),
            _ => Err(AssetError::UnsupportedFormat(uri.to_string())),
        }
    }
}

/// Decode an asset whose format is inferred from its location.
pub fn decode<F>(uri: &str, bytes: &[u8], resolve: F) -> Result<Mesh, AssetError>
where
    F: FnMut(&str) -> Result<Vec<u8>, AssetError>,
{
    let mesh = match AssetFormat::from_uri(uri)? {
        AssetFormat::Gltf => decode_gltf(bytes, resolve)?,
        AssetFormat::Stl => stl::parse_stl(bytes)?,
    };
    if mesh.is_empty() {
        return Err(AssetError::EmptyGeometry);
    }
    log::debug!("decoded {uri}: {} triangles", mesh.triangles.len());
    Ok(mesh)
}

/// Buffer locations a glTF file needs besides itself (relative as written).
pub fn external_buffers(uri: &str, bytes: &[u8]) -> Result<Vec<String>, AssetError> {
    if AssetFormat::from_uri(uri)? != AssetFormat::Gltf {
        return Ok(Vec::new());
    }
    let gltf = gltf::Gltf::from_slice(bytes)?;
    Ok(gltf
        .document
        .buffers()
        .filter_map(|buffer| match buffer.source() {
            Source::Uri(u) if !u.starts_with("data:") => Some(u.to_string()),
            _ => None,
        })
        .collect())
}

/// Resolve a buffer reference against the asset it was found in.
pub fn resolve_relative(base_uri: &str, reference: &str) -> String {
    if reference.contains("://") || reference.starts_with('/') {
        return reference.to_string();
    }
    match base_uri.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{reference}"),
        None => reference.to_string(),
    }
}

pub fn decode_gltf<F>(bytes: &[u8], mut resolve: F) -> Result<Mesh, AssetError>
where
    F: FnMut(&str) -> Result<Vec<u8>, AssetError>,
{
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;

    let mut blob = blob;
    let mut buffers: Vec<Vec<u8>> = Vec::with_capacity(document.buffers().len());
    for buffer in document.buffers() {
        let data = match buffer.source() {
            Source::Bin => blob
                .take()
                .ok_or_else(|| AssetError::MissingBuffer("GLB binary chunk".into()))?,
            Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)?,
            Source::Uri(uri) => resolve(uri)?,
        };
        buffers.push(data);
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    let mut mesh = Mesh::new();
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(&node, &Matrix4::identity(), &buffers, &mut mesh);
            }
        }
        // Scene-less files: take every mesh untransformed
        None => {
            for m in document.meshes() {
                collect_mesh(&m, &Matrix4::identity(), &buffers, &mut mesh);
            }
        }
    }
    Ok(mesh)
}

fn collect_node(node: &gltf::Node, parent: &Matrix4<f32>, buffers: &[Vec<u8>], out: &mut Mesh) {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(m) = node.mesh() {
        collect_mesh(&m, &world, buffers, out);
    }
    for child in node.children() {
        collect_node(&child, &world, buffers, out);
    }
}

fn collect_mesh(mesh: &gltf::Mesh, world: &Matrix4<f32>, buffers: &[Vec<u8>], out: &mut Mesh) {
    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<Point3<f32>> = positions
            .map(|p| world.transform_point(&Point3::from(p)))
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        for tri in indices.chunks_exact(3) {
            let corner = |i: u32| positions.get(i as usize).copied();
            if let (Some(a), Some(b), Some(c)) = (corner(tri[0]), corner(tri[1]), corner(tri[2])) {
                out.add_triangle(Triangle::from_positions(a, b, c));
            }
        }
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AssetError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| AssetError::DataUri("missing payload".into()))?;
    if !header.ends_with(";base64") {
        return Err(AssetError::DataUri(format!("unsupported encoding: {header}")));
    }
    BASE64
        .decode(payload)
        .map_err(|e| AssetError::DataUri(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One triangle, positions in an embedded data-URI buffer, inside a
    /// node translated by +2 on X.
    fn triangle_gltf() -> String {
        let mut bin = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        let data = BASE64.encode(&bin);
        format!(
            r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"mesh": 0, "translation": [2.0, 0.0, 0.0]}}],
  "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
  "buffers": [{{"byteLength": 36, "uri": "data:application/octet-stream;base64,{data}"}}],
  "bufferViews": [{{"buffer": 0, "byteLength": 36}}],
  "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}}]
}}"#
        )
    }

    fn no_external(uri: &str) -> Result<Vec<u8>, AssetError> {
        Err(AssetError::MissingBuffer(uri.to_string()))
    }

    #[test]
    fn test_format_from_uri() {
        assert_eq!(AssetFormat::from_uri("/models/untitled.glb").unwrap(), AssetFormat::Gltf);
        assert_eq!(AssetFormat::from_uri("/a/nikon.GLTF?v=2").unwrap(), AssetFormat::Gltf);
        assert_eq!(AssetFormat::from_uri("prop.stl").unwrap(), AssetFormat::Stl);
        assert!(AssetFormat::from_uri("/models/scene.fbx").is_err());
    }

    #[test]
    fn test_decode_gltf_applies_node_transform() {
        let text = triangle_gltf();
        let mesh = decode("/models/tri.gltf", text.as_bytes(), no_external).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        let bounds = mesh.bounds().unwrap();
        assert!((bounds.min.x - 2.0).abs() < 1e-6);
        assert!((bounds.max.x - 3.0).abs() < 1e-6);
    }

    /// The same asset with its buffer moved out to `scene.bin`.
    fn external_gltf() -> (String, Vec<u8>) {
        let text = triangle_gltf();
        let start = text.find("data:").unwrap();
        let end = start + text[start..].find('"').unwrap();
        let payload = BASE64.decode(text[start..end].split_once(',').unwrap().1).unwrap();
        (format!("{}scene.bin{}", &text[..start], &text[end..]), payload)
    }

    #[test]
    fn test_external_buffers_are_listed_and_resolved() {
        let (text, payload) = external_gltf();
        let listed = external_buffers("/assets/models/nikon.gltf", text.as_bytes()).unwrap();
        assert_eq!(listed, vec!["scene.bin".to_string()]);

        let mesh = decode("/assets/models/nikon.gltf", text.as_bytes(), |uri| {
            assert_eq!(resolve_relative("/assets/models/nikon.gltf", uri), "/assets/models/scene.bin");
            Ok(payload.clone())
        })
        .unwrap();
        assert_eq!(mesh.triangles.len(), 1);
    }

    #[test]
    fn test_missing_external_buffer_fails() {
        let (text, _) = external_gltf();
        let result = decode("/models/tri.gltf", text.as_bytes(), no_external);
        assert!(matches!(result, Err(AssetError::MissingBuffer(_))));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(decode("/models/untitled.glb", b"not a model", no_external).is_err());
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("/a/b.gltf", "c.bin"), "/a/c.bin");
        assert_eq!(resolve_relative("/a/b.gltf", "/x/c.bin"), "/x/c.bin");
        assert_eq!(resolve_relative("b.gltf", "c.bin"), "c.bin");
    }
}

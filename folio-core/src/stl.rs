/// STL decoding (binary and ASCII) for scene assets
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::AssetError;
use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Decode an STL asset, preferring ASCII when the data looks like text.
pub fn parse_stl(data: &[u8]) -> Result<Mesh, AssetError> {
    // Binary files may also start with "solid", so ASCII is only a first attempt.
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }
    parse_binary_stl(data)
}

pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, AssetError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(AssetError::Stl("file too small to be a valid STL".into()));
    }
    let (rest, triangle_count) = preceded(take(HEADER_LEN), le_u32)(data)
        .map_err(|e: nom::Err<nom::error::Error<&[u8]>>| AssetError::Stl(format!("{e:?}")))?;

    let triangle_count = triangle_count as usize;
    if rest.len() / FACET_LEN < triangle_count {
        return Err(AssetError::Stl(format!(
            "header declares {triangle_count} facets but only {} bytes follow",
            rest.len()
        )));
    }

    let (_, triangles) = count(binary_facet, triangle_count)(rest)
        .map_err(|e| AssetError::Stl(format!("{e:?}")))?;
    Ok(Mesh { triangles })
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = binary_vector(input)?;
    let (input, corners) = count(binary_vector, 3)(input)?;
    // Attribute byte count, unused
    let (input, _) = take(2usize)(input)?;
    Ok((input, facet(normal, [corners[0], corners[1], corners[2]])))
}

pub fn parse_ascii_stl(input: &str) -> Result<Mesh, AssetError> {
    match ascii_solid(input) {
        Ok((_, triangles)) => Ok(Mesh { triangles }),
        Err(e) => Err(AssetError::Stl(format!("failed to parse ASCII STL: {e:?}"))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<Triangle>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, triangles))
}

fn ascii_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vector(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, corners) = count(preceded(preceded(multispace0, tag("vertex")), ascii_vector), 3)(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;
    Ok((input, facet(normal, [corners[0], corners[1], corners[2]])))
}

fn ascii_vector(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, x) = preceded(multispace0, float)(input)?;
    let (input, y) = preceded(multispace1, float)(input)?;
    let (input, z) = preceded(multispace1, float)(input)?;
    Ok((input, [x, y, z]))
}

/// Exporters often write zero normals; fall back to the winding normal then.
fn facet(normal: [f32; 3], corners: [[f32; 3]; 3]) -> Triangle {
    let [a, b, c] = corners.map(Point3::from);
    let declared = Vector3::from(normal);
    match declared.try_normalize(1e-12) {
        Some(n) => Triangle::new(Vertex::new(a, n), Vertex::new(b, n), Vertex::new(c, n)),
        None => Triangle::from_positions(a, b, c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_with(facets: &[[[f32; 3]; 4]]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&(facets.len() as u32).to_le_bytes());
        for facet in facets {
            for v in facet {
                for c in v {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0, 0]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header_only() {
        let mesh = parse_binary_stl(&binary_with(&[])).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_parse_binary_facet_with_zero_normal() {
        let data = binary_with(&[[
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]]);
        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        let n = mesh.triangles[0].vertices[0].normal;
        assert!((n - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_truncated_binary_is_rejected() {
        let mut data = binary_with(&[]);
        data[HEADER_LEN..HEADER_LEN + 4].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(parse_binary_stl(&data), Err(AssetError::Stl(_))));
    }

    #[test]
    fn test_parse_ascii() {
        let text = "solid prop\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 1 0 0\n\
                vertex 0 1 0\n\
              endloop\n\
            endfacet\n\
            endsolid prop\n";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        assert!((mesh.triangles[0].vertices[1].position.x - 1.0).abs() < 1e-6);
    }
}

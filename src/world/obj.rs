//! Wavefront OBJ loading
//!
//! Understands `v`, `vt` and `f` records. Face corners may be written as
//! `v`, `v/vt`, `v/vt/vn` or `v//vn`; normals are ignored. Indices are
//! 1-based, negative ones count back from the latest record. Polygons with
//! more than three corners are split into a fan.
//!
//! A malformed record is logged with its line number and skipped.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::mesh::{Face, Mesh};
use crate::error::AssetError;
use crate::rasterizer::{Vec2, Vec3};

#[derive(Debug, Error, PartialEq)]
enum RecordError {
    #[error("expected {0} numbers")]
    MissingNumbers(usize),
    #[error("invalid number {0:?}")]
    BadNumber(String),
    #[error("face needs at least 3 corners")]
    TooFewCorners,
    #[error("malformed corner {0:?}")]
    BadCorner(String),
    #[error("index {0} out of range")]
    OutOfRange(i64),
}

/// Load and parse an OBJ file. A file without a single usable face is an error.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, AssetError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
    let mesh = parse_obj(&source);

    if mesh.face_count() == 0 {
        return Err(AssetError::EmptyMesh(path.to_path_buf()));
    }

    log::info!(
        "Loaded mesh: {} ({} vertices, {} uvs, {} faces)",
        path.display(),
        mesh.vertices().len(),
        mesh.uvs().len(),
        mesh.face_count()
    );
    Ok(mesh)
}

/// Parse OBJ text. Never fails; bad records are skipped.
pub fn parse_obj(source: &str) -> Mesh {
    let mut vertices = Vec::new();
    let mut uvs = Vec::new();
    let mut faces = Vec::new();

    for (number, line) in source.lines().enumerate() {
        let line = line.trim();
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        let result = match keyword {
            "v" => parse_numbers::<3>(tokens).map(|[x, y, z]| vertices.push(Vec3::new(x, y, z))),
            "vt" => parse_numbers::<2>(tokens).map(|[u, v]| uvs.push(Vec2::new(u, v))),
            "f" => parse_face(tokens, vertices.len(), uvs.len()).map(|fan| faces.extend(fan)),
            // Comments, normals, groups, smoothing and materials
            _ => Ok(()),
        };

        if let Err(e) = result {
            log::warn!("OBJ line {}: {} ({})", number + 1, e, line);
        }
    }

    Mesh::new(vertices, uvs, faces)
}

/// First `N` numbers; extra components (like `w`) are ignored
fn parse_numbers<'a, const N: usize>(
    mut tokens: impl Iterator<Item = &'a str>,
) -> Result<[f32; N], RecordError> {
    let mut out = [0.0; N];
    for slot in &mut out {
        let token = tokens.next().ok_or(RecordError::MissingNumbers(N))?;
        *slot = token
            .parse()
            .map_err(|_| RecordError::BadNumber(token.to_string()))?;
    }
    Ok(out)
}

/// Turn a 1-based or negative OBJ index into a 0-based one
fn resolve_index(raw: i64, count: usize) -> Result<usize, RecordError> {
    let resolved = if raw > 0 { raw - 1 } else { count as i64 + raw };
    if raw == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(RecordError::OutOfRange(raw));
    }
    Ok(resolved as usize)
}

/// One corner: vertex index and optional texture index
fn parse_corner(token: &str, vertex_count: usize, uv_count: usize) -> Result<(usize, Option<usize>), RecordError> {
    let bad = || RecordError::BadCorner(token.to_string());
    let mut parts = token.split('/');

    let vertex: i64 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
    let uv = match parts.next() {
        None | Some("") => None,
        Some(s) => Some(s.parse::<i64>().map_err(|_| bad())?),
    };
    if parts.clone().count() > 1 {
        return Err(bad());
    }

    let vertex = resolve_index(vertex, vertex_count)?;
    let uv = uv.map(|raw| resolve_index(raw, uv_count)).transpose()?;
    Ok((vertex, uv))
}

fn parse_face<'a>(
    tokens: impl Iterator<Item = &'a str>,
    vertex_count: usize,
    uv_count: usize,
) -> Result<Vec<Face>, RecordError> {
    let corners = tokens
        .map(|t| parse_corner(t, vertex_count, uv_count))
        .collect::<Result<Vec<_>, _>>()?;

    if corners.len() < 3 {
        return Err(RecordError::TooFewCorners);
    }

    let textured = corners.iter().all(|(_, uv)| uv.is_some());
    let fan = (1..corners.len() - 1)
        .map(|i| {
            let [a, b, c] = [corners[0], corners[i], corners[i + 1]];
            let vertices = [a.0, b.0, c.0];
            match (textured, a.1, b.1, c.1) {
                (true, Some(ta), Some(tb), Some(tc)) => Face::with_uvs(vertices, [ta, tb, tc]),
                _ => Face::new(vertices),
            }
        })
        .collect();
    Ok(fan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# two triangles
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
s off
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mesh = parse_obj(QUAD);
        assert_eq!(mesh.vertices().len(), 4);
        assert_eq!(mesh.uvs().len(), 4);
        assert_eq!(
            mesh.faces(),
            &[
                Face::with_uvs([0, 1, 2], [0, 1, 2]),
                Face::with_uvs([0, 2, 3], [0, 2, 3]),
            ]
        );
    }

    #[test]
    fn test_corner_forms() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5 0.5\nf 1 2 3\nf 1//1 2//1 3//1\nf 1/1 2/1 3/1\n");
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.faces()[0], Face::new([0, 1, 2]));
        assert_eq!(mesh.faces()[1], Face::new([0, 1, 2]));
        assert_eq!(mesh.faces()[2], Face::with_uvs([0, 1, 2], [0, 0, 0]));
    }

    #[test]
    fn test_negative_indices_count_back() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n");
        assert_eq!(mesh.faces(), &[Face::new([0, 1, 2])]);
    }

    #[test]
    fn test_partial_uvs_drop_face_uvs() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2 3/1\n");
        assert_eq!(mesh.faces(), &[Face::new([0, 1, 2])]);
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let source = "\
v 0 0 0
v 1 0 zero
v 1 0 0
v 0 1 0
f 1 2 3
f 1 2 9
f 1 2
f 0 1 2
f a b c
f 1 2 3
";
        let mesh = parse_obj(source);
        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn test_face_lookup_after_parse() {
        let mesh = parse_obj(QUAD);
        let face = mesh.face(1);
        assert_eq!(face.vertices[2], Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(face.uvs[1], Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_resolve_index_bounds() {
        assert_eq!(resolve_index(1, 3), Ok(0));
        assert_eq!(resolve_index(-1, 3), Ok(2));
        assert_eq!(resolve_index(0, 3), Err(RecordError::OutOfRange(0)));
        assert_eq!(resolve_index(4, 3), Err(RecordError::OutOfRange(4)));
        assert_eq!(resolve_index(-4, 3), Err(RecordError::OutOfRange(-4)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_obj("definitely/not/here.obj").unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_load_file_without_faces_is_empty_mesh() {
        let path = std::env::temp_dir().join(format!("softras-empty-{}.obj", std::process::id()));
        fs::write(&path, "v 0 0 0\n").unwrap();
        let err = load_obj(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, AssetError::EmptyMesh(_)));
    }

    #[test]
    fn test_bundled_cube_asset_matches_unit_cube() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/mesh/cube.obj");
        let mesh = load_obj(path).unwrap();
        let cube = Mesh::unit_cube();
        assert_eq!(mesh.vertices(), cube.vertices());
        assert_eq!(mesh.face_count(), 12);
        for i in 0..12 {
            assert_eq!(mesh.faces()[i].vertices, cube.faces()[i].vertices);
        }
    }
}

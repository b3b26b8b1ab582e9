//! Wavefront OBJ loading.
//!
//! Supports triangular and polygonal faces (fan-triangulated). Only
//! vertex positions and face indices are read; normals, texture
//! coordinates, materials, and groups are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nalgebra::Point3;
use tracing::{debug, warn};

use levelset_types::TriMesh;

use crate::error::{IoError, IoResult};

/// Load a mesh from a Wavefront OBJ file.
///
/// `v` records contribute positions (first three numeric fields), `f`
/// records contribute faces; a face token may be `index`, `index/uv`, or
/// `index/uv/normal`, and only the leading 1-based vertex index is used.
/// Faces with more than three vertices are fan-triangulated from their
/// first vertex. Every other record is ignored.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a face index is not a
/// positive integer, or no vertices or faces were found.
///
/// # Example
///
/// ```no_run
/// use levelset_io::load_obj;
///
/// let mesh = load_obj("model.obj").unwrap();
/// println!("{} triangles", mesh.triangle_count());
/// ```
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<TriMesh> {
    let path = path.as_ref();
    let file = open_file(path)?;
    let reader = BufReader::new(file);

    let mut mesh = TriMesh::new();
    let mut ignored_lines = 0u32;

    for line in reader.lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                let mut coords = [0.0f32; 3];
                let mut parsed = 0;
                for slot in &mut coords {
                    match fields.next().map(str::parse) {
                        Some(Ok(value)) => {
                            *slot = value;
                            parsed += 1;
                        }
                        _ => break,
                    }
                }
                if parsed == 3 {
                    mesh.positions
                        .push(Point3::new(coords[0], coords[1], coords[2]));
                } else {
                    warn!(%line, "skipping unparseable vertex record");
                }
            }
            Some("f") => {
                let mut indices = Vec::new();
                for token in fields {
                    indices.push(parse_face_index(token)?);
                }
                if indices.len() < 3 {
                    warn!(%line, "skipping face with fewer than 3 vertices");
                    continue;
                }
                // Fan triangulation from the first vertex
                for window in 1..indices.len() - 1 {
                    mesh.triangles
                        .push([indices[0], indices[window], indices[window + 1]]);
                }
            }
            _ => ignored_lines += 1,
        }
    }

    if mesh.positions.is_empty() {
        return Err(IoError::mesh_parse("no vertices found in OBJ file"));
    }
    if mesh.triangles.is_empty() {
        return Err(IoError::mesh_parse("no faces found in OBJ file"));
    }

    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        ignored_lines,
        "loaded OBJ mesh"
    );
    Ok(mesh)
}

/// Extract the 0-based vertex index from a face token.
fn parse_face_index(token: &str) -> IoResult<u32> {
    let lead = token.split('/').next().unwrap_or(token);
    let index: i64 = lead.parse()?;
    if index < 1 {
        return Err(IoError::mesh_parse(format!(
            "unsupported face index {index}; indices must be positive"
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Truncation: mesh indices beyond u32 are not supported
    Ok((index - 1) as u32)
}

pub(crate) fn open_file(path: &Path) -> IoResult<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_triangles_and_skips_attributes() {
        let file = write_temp(
            "# comment\n\
             v 0.0 0.0 0.0\n\
             v 1.0 0.0 0.0\n\
             v 0.0 1.0 0.0\n\
             vn 0.0 0.0 1.0\n\
             vt 0.5 0.5\n\
             f 1/1/1 2/2/1 3/3/1\n",
        );
        let mesh = load_obj(file.path()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn fan_triangulates_quads() {
        let file = write_temp(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             f 1 2 3 4\n",
        );
        let mesh = load_obj(file.path()).unwrap();
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn rejects_missing_faces() {
        let file = write_temp("v 0 0 0\nv 1 0 0\nv 0 1 0\n");
        assert!(matches!(
            load_obj(file.path()),
            Err(IoError::MeshParse { .. })
        ));
    }

    #[test]
    fn rejects_negative_indices() {
        let file = write_temp("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -1 -2 -3\n");
        assert!(load_obj(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            load_obj("/nonexistent/mesh.obj"),
            Err(IoError::FileNotFound { .. })
        ));
    }

    #[test]
    fn face_index_token_forms() {
        assert_eq!(parse_face_index("7").unwrap(), 6);
        assert_eq!(parse_face_index("7/2").unwrap(), 6);
        assert_eq!(parse_face_index("7/2/9").unwrap(), 6);
        assert_eq!(parse_face_index("7//9").unwrap(), 6);
        assert!(parse_face_index("abc").is_err());
    }
}

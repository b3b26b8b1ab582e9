//! STL (stereolithography) loading.
//!
//! Both binary and ASCII variants are supported with automatic detection:
//! a file opening with `solid` is ASCII unless its length exactly matches
//! the binary layout implied by the triangle count at offset 80. STL
//! stores no connectivity, so every triangle contributes three fresh
//! vertices.
//!
//! # Binary Layout
//!
//! ```text
//! UINT8[80]    - header (ignored)
//! UINT32       - triangle count
//! foreach triangle
//!     REAL32[3] - normal (ignored)
//!     REAL32[9] - three vertices
//!     UINT16    - attribute byte count
//! end
//! ```

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use nalgebra::Point3;
use tracing::debug;

use levelset_types::TriMesh;

use crate::error::{IoError, IoResult};
use crate::obj::open_file;

/// STL binary header size in bytes.
const HEADER_SIZE: u64 = 80;

/// Size of one triangle record in binary STL.
const TRIANGLE_SIZE: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StlFormat {
    Binary,
    Ascii,
}

/// Load a mesh from an STL file, auto-detecting the variant.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is truncated, or is not
/// valid STL.
///
/// # Example
///
/// ```no_run
/// use levelset_io::load_stl;
///
/// let mesh = load_stl("part.stl").unwrap();
/// println!("{} triangles", mesh.triangle_count());
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<TriMesh> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    debug!(path = %path.display(), ?format, "detected STL variant");
    let mesh = match format {
        StlFormat::Binary => load_binary(path)?,
        StlFormat::Ascii => load_ascii(path)?,
    };
    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "loaded STL mesh"
    );
    Ok(mesh)
}

/// Decide between binary and ASCII.
///
/// Binary files occasionally carry `solid` in their free-form header, so
/// a leading `solid` alone is not conclusive: when the file length
/// exactly matches `84 + 50 * count` for the count stored at offset 80,
/// the file is treated as binary.
fn detect_format(path: &Path) -> IoResult<StlFormat> {
    let mut file = open_file(path)?;

    let mut header = [0u8; HEADER_SIZE as usize];
    let read = file.read(&mut header)?;
    if read < 5 {
        return Err(IoError::mesh_parse("file too small to be valid STL"));
    }

    let leading = String::from_utf8_lossy(&header[..read]);
    if !leading.trim_start().to_ascii_lowercase().starts_with("solid") {
        return Ok(StlFormat::Binary);
    }

    let mut count_bytes = [0u8; 4];
    if file.seek(SeekFrom::Start(HEADER_SIZE)).is_err()
        || file.read_exact(&mut count_bytes).is_err()
    {
        return Ok(StlFormat::Ascii);
    }
    let count = u64::from(u32::from_le_bytes(count_bytes));
    let expected = HEADER_SIZE + 4 + count * TRIANGLE_SIZE;
    let actual = file.metadata()?.len();

    if actual == expected {
        Ok(StlFormat::Binary)
    } else {
        Ok(StlFormat::Ascii)
    }
}

#[allow(clippy::cast_possible_truncation)]
// Truncation: STL meshes beyond u32 vertices are not supported
fn load_binary(path: &Path) -> IoResult<TriMesh> {
    let file = open_file(path)?;
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_SIZE as usize + 4];
    reader
        .read_exact(&mut header)
        .map_err(|_| IoError::UnexpectedEof { position: 0 })?;
    let count = u32::from_le_bytes([
        header[HEADER_SIZE as usize],
        header[HEADER_SIZE as usize + 1],
        header[HEADER_SIZE as usize + 2],
        header[HEADER_SIZE as usize + 3],
    ]);

    let mut mesh = TriMesh::with_capacity(count as usize * 3, count as usize);
    let mut record = [0u8; TRIANGLE_SIZE as usize];
    for t in 0..u64::from(count) {
        reader.read_exact(&mut record).map_err(|_| IoError::UnexpectedEof {
            position: HEADER_SIZE + 4 + t * TRIANGLE_SIZE,
        })?;

        // 12 bytes of normal skipped, then 9 floats of vertex data
        let base = mesh.positions.len() as u32;
        for v in 0..3 {
            let offset = 12 + v * 12;
            let x = f32::from_le_bytes(slice4(&record, offset));
            let y = f32::from_le_bytes(slice4(&record, offset + 4));
            let z = f32::from_le_bytes(slice4(&record, offset + 8));
            mesh.positions.push(Point3::new(x, y, z));
        }
        mesh.triangles.push([base, base + 1, base + 2]);
    }

    if mesh.triangles.is_empty() {
        return Err(IoError::mesh_parse("binary STL contains no triangles"));
    }
    Ok(mesh)
}

#[inline]
fn slice4(buffer: &[u8], offset: usize) -> [u8; 4] {
    [
        buffer[offset],
        buffer[offset + 1],
        buffer[offset + 2],
        buffer[offset + 3],
    ]
}

#[allow(clippy::cast_possible_truncation)]
// Truncation: STL meshes beyond u32 vertices are not supported
fn load_ascii(path: &Path) -> IoResult<TriMesh> {
    let file = open_file(path)?;
    let reader = BufReader::new(file);

    let mut mesh = TriMesh::new();
    let mut in_solid = false;
    let mut in_facet = false;
    let mut in_loop = false;
    let mut vertex_in_facet = 0u32;
    let mut facet_start = 0u32;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("endsolid") {
            in_solid = false;
        } else if lower.starts_with("solid") {
            in_solid = true;
        } else if lower.starts_with("endfacet") {
            if vertex_in_facet != 3 {
                return Err(IoError::mesh_parse(format!(
                    "facet has {vertex_in_facet} vertices, expected 3"
                )));
            }
            in_facet = false;
            mesh.triangles
                .push([facet_start, facet_start + 1, facet_start + 2]);
        } else if lower.starts_with("facet") {
            if !in_solid {
                return Err(IoError::mesh_parse("'facet' outside 'solid' block"));
            }
            in_facet = true;
            vertex_in_facet = 0;
            facet_start = mesh.positions.len() as u32;
        } else if lower.starts_with("outer loop") {
            in_loop = true;
        } else if lower.starts_with("endloop") {
            in_loop = false;
        } else if lower.starts_with("vertex") {
            if !in_facet || !in_loop {
                return Err(IoError::mesh_parse("'vertex' outside facet loop"));
            }
            let mut fields = trimmed.split_whitespace().skip(1);
            let mut coords = [0.0f32; 3];
            for slot in &mut coords {
                let token = fields
                    .next()
                    .ok_or_else(|| IoError::mesh_parse(format!("malformed vertex: {trimmed}")))?;
                *slot = token.parse()?;
            }
            mesh.positions
                .push(Point3::new(coords[0], coords[1], coords[2]));
            vertex_in_facet += 1;
        }
        // "facet normal ..." components and anything else are ignored
    }

    if mesh.positions.is_empty() || mesh.triangles.is_empty() {
        return Err(IoError::mesh_parse("no triangles found in ASCII STL"));
    }
    Ok(mesh)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Write;

    /// One-triangle binary STL with the given header bytes.
    fn binary_stl(header_text: &[u8], triangle_count: u32, records: u32) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data[..header_text.len()].copy_from_slice(header_text);
        data.extend_from_slice(&triangle_count.to_le_bytes());
        for t in 0..records {
            // Normal
            data.extend_from_slice(&[0u8; 12]);
            // Vertices of a thin triangle in the z = t plane
            let z = t as f32;
            for (x, y) in [(0.0f32, 0.0f32), (1.0, 0.0), (0.0, 1.0)] {
                data.extend_from_slice(&x.to_le_bytes());
                data.extend_from_slice(&y.to_le_bytes());
                data.extend_from_slice(&z.to_le_bytes());
            }
            // Attribute bytes
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    const ASCII_STL: &str = "solid demo\n\
        facet normal 0 0 1\n\
          outer loop\n\
            vertex 0.0 0.0 0.0\n\
            vertex 1.0 0.0 0.0\n\
            vertex 0.0 1.0 0.0\n\
          endloop\n\
        endfacet\n\
        endsolid demo\n";

    #[test]
    fn loads_binary() {
        let file = write_temp(&binary_stl(b"binary part", 2, 2));
        let mesh = load_stl(file.path()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.positions[3].z, 1.0);
    }

    #[test]
    fn loads_ascii() {
        let file = write_temp(ASCII_STL.as_bytes());
        let mesh = load_stl(file.path()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangles[0], [0, 1, 2]);
    }

    #[test]
    fn binary_with_solid_header_detected_by_size() {
        // Header starts with "solid" but the length matches the binary
        // layout exactly
        let file = write_temp(&binary_stl(b"solid but binary", 1, 1));
        assert_eq!(detect_format(file.path()).unwrap(), StlFormat::Binary);
        let mesh = load_stl(file.path()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn ascii_detected_despite_binary_probe() {
        let file = write_temp(ASCII_STL.as_bytes());
        assert_eq!(detect_format(file.path()).unwrap(), StlFormat::Ascii);
    }

    #[test]
    fn truncated_binary_reports_eof() {
        let mut data = binary_stl(b"truncated", 2, 2);
        data.truncate(data.len() - 10);
        let file = write_temp(&data);
        assert!(matches!(
            load_stl(file.path()),
            Err(IoError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn misplaced_facet_is_rejected() {
        let file = write_temp(b"solid x\nendsolid x\nfacet normal 0 0 1\n");
        assert!(matches!(
            load_stl(file.path()),
            Err(IoError::MeshParse { .. })
        ));
    }

    #[test]
    fn tiny_file_is_rejected() {
        let file = write_temp(b"so");
        assert!(load_stl(file.path()).is_err());
    }
}

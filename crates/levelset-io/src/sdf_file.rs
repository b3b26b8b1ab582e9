//! Binary SDF container reading and writing.
//!
//! Little-endian layout:
//!
//! | Offset | Size | Contents |
//! |-------:|-----:|----------|
//! | 0      | 12   | `ni, nj, nk` as three i32 |
//! | 12     | 12   | bounds minimum as three f32 |
//! | 24     | 12   | bounds maximum as three f32 |
//! | 36     | 4·n  | distances as f32, written `for i { for j { for k } }` |
//!
//! The bounds maximum equals `origin + dx * dims`. The cell order in the
//! file is k-fastest, the transpose of the in-memory i-fastest layout.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point3;
use tracing::debug;

use levelset_types::{Aabb, GridSpec, ScalarGrid};

use crate::error::{IoError, IoResult};
use crate::obj::open_file;

/// Size of the container header in bytes.
const HEADER_SIZE: u64 = 36;

/// Write a distance grid to a binary SDF container.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
///
/// # Example
///
/// ```no_run
/// use levelset_io::write_sdf;
/// use levelset_types::{GridSpec, ScalarGrid};
/// use nalgebra::Point3;
///
/// let spec = GridSpec::new((4, 4, 4), Point3::origin(), 0.5);
/// let grid = ScalarGrid::from_spec(&spec, 1.0);
/// write_sdf("out.sdf", &grid).unwrap();
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
// Truncation: grids beyond i32 dimensions are not representable in the container
pub fn write_sdf<P: AsRef<Path>>(path: P, grid: &ScalarGrid) -> IoResult<()> {
    let path = path.as_ref();
    let spec = grid.spec();
    let (ni, nj, nk) = spec.dims;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for dim in [ni, nj, nk] {
        writer.write_all(&(dim as i32).to_le_bytes())?;
    }
    let min = spec.origin;
    let max = spec.max_corner();
    for value in [min.x, min.y, min.z, max.x, max.y, max.z] {
        writer.write_all(&value.to_le_bytes())?;
    }

    for i in 0..ni {
        for j in 0..nj {
            for k in 0..nk {
                writer.write_all(&grid.get(i, j, k).to_le_bytes())?;
            }
        }
    }
    writer.flush()?;

    debug!(path = %path.display(), dims = ?spec.dims, "wrote SDF container");
    Ok(())
}

/// Read a distance grid from a binary SDF container.
///
/// Returns the grid together with the bounds stored in the header. The
/// grid's spacing is reconstructed from the bounds and dimensions.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the header is invalid,
/// or the data section is truncated.
pub fn read_sdf<P: AsRef<Path>>(path: P) -> IoResult<(ScalarGrid, Aabb)> {
    let path = path.as_ref();
    let file = open_file(path)?;
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_SIZE as usize];
    reader
        .read_exact(&mut header)
        .map_err(|_| IoError::UnexpectedEof { position: 0 })?;

    let mut dims = [0i32; 3];
    for (slot, chunk) in dims.iter_mut().zip(header[..12].chunks_exact(4)) {
        *slot = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    if dims.iter().any(|&d| d <= 0) {
        return Err(IoError::InvalidSdfHeader {
            message: format!("non-positive dimensions {}x{}x{}", dims[0], dims[1], dims[2]),
        });
    }

    let mut floats = [0.0f32; 6];
    for (slot, chunk) in floats.iter_mut().zip(header[12..].chunks_exact(4)) {
        *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let min = Point3::new(floats[0], floats[1], floats[2]);
    let max = Point3::new(floats[3], floats[4], floats[5]);

    #[allow(clippy::cast_sign_loss)]
    // Sign loss: dimensions were checked positive above
    let (ni, nj, nk) = (dims[0] as usize, dims[1] as usize, dims[2] as usize);
    #[allow(clippy::cast_precision_loss)]
    // Precision loss: grid dimensions are far below 2^24
    let dx = (max.x - min.x) / ni as f32;
    let spec = GridSpec::new((ni, nj, nk), min, dx);

    let mut values = vec![0.0f32; spec.cell_count()];
    let mut cell = [0u8; 4];
    let mut consumed = 0u64;
    for i in 0..ni {
        for j in 0..nj {
            for k in 0..nk {
                reader.read_exact(&mut cell).map_err(|_| IoError::UnexpectedEof {
                    position: HEADER_SIZE + consumed,
                })?;
                consumed += 4;
                values[spec.index(i, j, k)] = f32::from_le_bytes(cell);
            }
        }
    }

    debug!(path = %path.display(), dims = ?spec.dims, "read SDF container");
    let grid = ScalarGrid::from_values(&spec, values).ok_or_else(|| IoError::InvalidSdfHeader {
        message: "cell count overflow".into(),
    })?;
    Ok((grid, Aabb::new(min, max)))
}

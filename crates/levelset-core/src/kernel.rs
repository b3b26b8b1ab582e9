//! The level set kernel.
//!
//! Three-phase pipeline over a uniform grid:
//!
//! 1. **Narrow-band exact pass** - for every triangle, exact point-triangle
//!    distances are written into every cell within `exact_band` cells of the
//!    triangle's bounding box, together with the identity of the winning
//!    triangle and ray-crossing counts for sign recovery.
//! 2. **Sign resolution** - each `(j, k)` column is walked along `+i`,
//!    accumulating crossing parity; cells behind an odd number of crossings
//!    are negated.
//! 3. **Fast sweeping** - two Gauss-Seidel passes over the eight axis
//!    orderings propagate closest-triangle identities outward, recomputing
//!    true distances and tightening magnitudes while preserving signs.
//!
//! The narrow-band pass is parallelized by partitioning triangles into
//! contiguous chunks, one spawned worker per chunk, each owning private
//! full-size grids that are merged afterwards. The merge visits workers in
//! chunk order with strict minimization, so the winning triangle for a cell
//! is always the lowest-indexed one attaining the minimum and the output is
//! bit-identical for every thread count.

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{debug, info};

use levelset_types::{GridSpec, ScalarGrid};

use crate::backend::{self, Backend, ResolvedBackend};
use crate::error::{LevelSetError, LevelSetResult};
use crate::geometry::{point_in_triangle_2d, point_triangle_distance};

/// Sentinel triangle id meaning "no triangle bound yet".
const NO_TRIANGLE: u32 = u32::MAX;

/// Tuning parameters for [`make_level_set3`].
///
/// # Example
///
/// ```
/// use levelset_core::LevelSetParams;
///
/// let params = LevelSetParams::default();
/// assert_eq!(params.exact_band, 1);
/// assert_eq!(params.num_threads, 0);
/// ```
#[derive(Debug, Clone)]
pub struct LevelSetParams {
    /// Width, in cells, of the band around each triangle in which exact
    /// point-triangle distances are computed. Cells further out receive
    /// their values from the sweeping pass.
    pub exact_band: usize,
    /// Hardware backend selection.
    pub backend: Backend,
    /// CPU worker count; 0 selects the hardware parallelism.
    pub num_threads: usize,
}

impl Default for LevelSetParams {
    fn default() -> Self {
        Self {
            exact_band: 1,
            backend: Backend::Auto,
            num_threads: 0,
        }
    }
}

/// Compute a signed distance field from a closed, oriented triangle mesh.
///
/// On success `phi` is resized to the grid dimensions and every cell holds
/// the signed Euclidean distance from its sample point to the mesh surface,
/// in world units: negative inside, positive outside. Distances within
/// `exact_band` cells of a triangle are exact; farther cells hold the
/// distance to a nearby (not necessarily the globally nearest) triangle.
///
/// Inside/outside is recovered from ray-crossing parity, so the mesh should
/// be closed and consistently oriented for meaningful signs; triangle soups
/// still produce correct magnitudes.
///
/// # Arguments
///
/// * `triangles` - Triangle vertex indices
/// * `vertices` - Vertex positions in world coordinates
/// * `grid` - Grid origin, spacing, and dimensions
/// * `phi` - Output grid, resized by this call
/// * `params` - Band width, backend, and thread count
///
/// # Errors
///
/// * [`LevelSetError::InvalidGridDimensions`] - a dimension is zero or the
///   spacing is not a positive finite number
/// * [`LevelSetError::EmptyMesh`] - no vertices or no triangles
/// * [`LevelSetError::BadTriangleIndex`] - an index is out of range
/// * [`LevelSetError::BackendUnavailable`] - GPU requested but unusable
///
/// The grid is untouched when an error is returned.
///
/// # Example
///
/// ```
/// use levelset_core::{make_level_set3, LevelSetParams};
/// use levelset_types::{GridSpec, ScalarGrid};
/// use nalgebra::Point3;
///
/// // A tetrahedron with outward-facing triangles
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
/// ];
/// let triangles = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
///
/// let spec = GridSpec::new((12, 12, 12), Point3::new(-0.1, -0.1, -0.1), 0.1);
/// let mut phi = ScalarGrid::from_spec(&spec, 0.0);
/// make_level_set3(&triangles, &vertices, &spec, &mut phi, &LevelSetParams::default())?;
///
/// // The sample near the centroid is inside
/// assert!(phi.get(3, 3, 3) < 0.0);
/// # Ok::<(), levelset_core::LevelSetError>(())
/// ```
pub fn make_level_set3(
    triangles: &[[u32; 3]],
    vertices: &[Point3<f32>],
    grid: &GridSpec,
    phi: &mut ScalarGrid,
    params: &LevelSetParams,
) -> LevelSetResult<()> {
    validate(triangles, vertices, grid)?;

    match backend::resolve(params.backend)? {
        ResolvedBackend::Cpu => {
            backend::record_last_used(Backend::Cpu);
            compute_cpu(triangles, vertices, grid, phi, params);
            Ok(())
        }
        #[cfg(feature = "gpu")]
        ResolvedBackend::Gpu => {
            backend::record_last_used(Backend::Gpu);
            compute_gpu(triangles, vertices, grid, phi)
        }
    }
}

fn validate(
    triangles: &[[u32; 3]],
    vertices: &[Point3<f32>],
    grid: &GridSpec,
) -> LevelSetResult<()> {
    let (ni, nj, nk) = grid.dims;
    if ni == 0 || nj == 0 || nk == 0 || !grid.dx.is_finite() || grid.dx <= 0.0 {
        return Err(LevelSetError::InvalidGridDimensions {
            ni,
            nj,
            nk,
            dx: grid.dx,
        });
    }
    if triangles.is_empty() || vertices.is_empty() {
        return Err(LevelSetError::EmptyMesh);
    }
    for (t, tri) in triangles.iter().enumerate() {
        for &index in tri {
            if index as usize >= vertices.len() {
                return Err(LevelSetError::BadTriangleIndex {
                    triangle: t,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
    }
    Ok(())
}

/// Per-worker private grids for the narrow-band pass.
struct WorkerGrids {
    phi: Vec<f32>,
    closest: Vec<u32>,
    counts: Vec<u32>,
}

impl WorkerGrids {
    fn new(cells: usize, sentinel: f32) -> Self {
        Self {
            phi: vec![sentinel; cells],
            closest: vec![NO_TRIANGLE; cells],
            counts: vec![0; cells],
        }
    }
}

#[allow(clippy::cast_precision_loss)]
// Precision loss: grid dimensions are far below 2^24
fn sentinel_distance(spec: &GridSpec) -> f32 {
    (spec.dims.0 + spec.dims.1 + spec.dims.2) as f32 * spec.dx
}

fn thread_count(requested: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
    }
}

fn compute_cpu(
    triangles: &[[u32; 3]],
    vertices: &[Point3<f32>],
    spec: &GridSpec,
    phi: &mut ScalarGrid,
    params: &LevelSetParams,
) {
    let workers = thread_count(params.num_threads);
    let sentinel = sentinel_distance(spec);

    info!(
        triangles = triangles.len(),
        vertices = vertices.len(),
        dims = ?spec.dims,
        workers,
        "computing level set on CPU"
    );

    debug!(exact_band = params.exact_band, "narrow-band exact pass");
    let partials = if workers == 1 {
        vec![scan_chunk(
            triangles,
            0,
            vertices,
            spec,
            params.exact_band,
            sentinel,
        )]
    } else {
        let chunk_len = triangles.len().div_ceil(workers);
        std::thread::scope(|scope| {
            let handles: Vec<_> = triangles
                .chunks(chunk_len)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    scope.spawn(move || {
                        scan_chunk(
                            chunk,
                            chunk_idx * chunk_len,
                            vertices,
                            spec,
                            params.exact_band,
                            sentinel,
                        )
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(grids) => grids,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    };

    let mut merged = merge_partials(partials);

    debug!("sign resolution");
    resolve_signs(&mut merged.phi, &merged.counts, spec.dims.0);

    debug!("fast sweeping");
    sweep_all(triangles, vertices, spec, &mut merged.phi, &mut merged.closest);

    phi.resize(spec, 0.0);
    phi.as_mut_slice().copy_from_slice(&merged.phi);
}

#[cfg(feature = "gpu")]
fn compute_gpu(
    triangles: &[[u32; 3]],
    vertices: &[Point3<f32>],
    spec: &GridSpec,
    phi: &mut ScalarGrid,
) -> LevelSetResult<()> {
    info!(
        triangles = triangles.len(),
        dims = ?spec.dims,
        "computing level set on GPU"
    );
    let values = levelset_gpu::compute_level_set(triangles, vertices, spec)?;
    phi.resize(spec, 0.0);
    phi.as_mut_slice().copy_from_slice(&values);
    Ok(())
}

/// Scan one contiguous chunk of triangles into private grids.
fn scan_chunk(
    chunk: &[[u32; 3]],
    first_triangle: usize,
    vertices: &[Point3<f32>],
    spec: &GridSpec,
    exact_band: usize,
    sentinel: f32,
) -> WorkerGrids {
    let mut grids = WorkerGrids::new(spec.cell_count(), sentinel);
    for (offset, tri) in chunk.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: triangle counts beyond u32 are rejected upstream by memory alone
        let id = (first_triangle + offset) as u32;
        scan_triangle(id, tri, vertices, spec, exact_band, &mut grids);
    }
    grids
}

/// Fractional grid coordinates of a world-space point.
fn fractional(p: Point3<f32>, spec: &GridSpec) -> [f64; 3] {
    let dx = f64::from(spec.dx);
    [
        (f64::from(p.x) - f64::from(spec.origin.x)) / dx,
        (f64::from(p.y) - f64::from(spec.origin.y)) / dx,
        (f64::from(p.z) - f64::from(spec.origin.z)) / dx,
    ]
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
// Casts: index arithmetic is clamped to grid bounds before narrowing
fn scan_triangle(
    id: u32,
    tri: &[u32; 3],
    vertices: &[Point3<f32>],
    spec: &GridSpec,
    exact_band: usize,
    grids: &mut WorkerGrids,
) {
    let (ni, nj, nk) = spec.dims;
    let p = vertices[tri[0] as usize];
    let q = vertices[tri[1] as usize];
    let r = vertices[tri[2] as usize];

    let fp = fractional(p, spec);
    let fq = fractional(q, spec);
    let fr = fractional(r, spec);
    let band = exact_band as isize;

    let lo = |a: f64, b: f64, c: f64, n: usize| -> usize {
        ((a.min(b).min(c).floor() as isize) - band).clamp(0, n as isize - 1) as usize
    };
    // Exclusive upper bound
    let hi = |a: f64, b: f64, c: f64, n: usize| -> usize {
        ((a.max(b).max(c).ceil() as isize) + band + 1).clamp(0, n as isize) as usize
    };

    let i0 = lo(fp[0], fq[0], fr[0], ni);
    let i1 = hi(fp[0], fq[0], fr[0], ni);
    let j0 = lo(fp[1], fq[1], fr[1], nj);
    let j1 = hi(fp[1], fq[1], fr[1], nj);
    let k0 = lo(fp[2], fq[2], fr[2], nk);
    let k1 = hi(fp[2], fq[2], fr[2], nk);

    for k in k0..k1 {
        for j in j0..j1 {
            let row = spec.index(0, j, k);
            for i in i0..i1 {
                let gx = spec.position(i, j, k);
                let d = point_triangle_distance(gx, p, q, r);
                let idx = row + i;
                if d < grids.phi[idx] {
                    grids.phi[idx] = d;
                    grids.closest[idx] = id;
                }
            }
        }
    }

    // Crossing contributions: every lattice point of the (j, k) projection
    // contained in the projected triangle adds one crossing at the cell
    // just past the fractional intersection along +i.
    let lat_lo = |a: f64, b: f64, c: f64, n: usize| -> usize {
        (a.min(b).min(c).ceil() as isize).clamp(0, n as isize - 1) as usize
    };
    let lat_hi = |a: f64, b: f64, c: f64, n: usize| -> usize {
        (a.max(b).max(c).floor() as isize).clamp(0, n as isize - 1) as usize
    };

    let pj0 = lat_lo(fp[1], fq[1], fr[1], nj);
    let pj1 = lat_hi(fp[1], fq[1], fr[1], nj);
    let pk0 = lat_lo(fp[2], fq[2], fr[2], nk);
    let pk1 = lat_hi(fp[2], fq[2], fr[2], nk);

    for k in pk0..=pk1 {
        for j in pj0..=pj1 {
            let Some((a, b, c)) = point_in_triangle_2d(
                j as f64, k as f64, fp[1], fp[2], fq[1], fq[2], fr[1], fr[2],
            ) else {
                continue;
            };
            // Fractional i where the +i ray pierces the triangle plane
            let fi = a * fp[0] + b * fq[0] + c * fr[0];
            let interval = fi.ceil() as isize;
            if interval < 0 {
                grids.counts[spec.index(0, j, k)] += 1;
            } else if (interval as usize) < ni {
                grids.counts[spec.index(interval as usize, j, k)] += 1;
            }
            // Crossings past the far end of the grid affect no cell.
        }
    }
}

/// Merge per-worker grids in chunk order.
///
/// Strict `<` keeps the earliest worker's triangle on ties, matching a
/// sequential scan over the full triangle list.
fn merge_partials(mut partials: Vec<WorkerGrids>) -> WorkerGrids {
    let mut merged = partials.remove(0);
    for part in partials {
        for idx in 0..merged.phi.len() {
            if part.phi[idx] < merged.phi[idx] {
                merged.phi[idx] = part.phi[idx];
                merged.closest[idx] = part.closest[idx];
            }
            merged.counts[idx] += part.counts[idx];
        }
    }
    merged
}

/// Negate cells behind an odd number of ray crossings.
///
/// Each `(j, k)` column is one contiguous `ni`-long run, walked with a
/// running crossing total; columns are independent.
fn resolve_signs(phi: &mut [f32], counts: &[u32], ni: usize) {
    phi.par_chunks_mut(ni)
        .zip(counts.par_chunks(ni))
        .for_each(|(phi_column, count_column)| {
            let mut crossings = 0u32;
            for (value, &count) in phi_column.iter_mut().zip(count_column) {
                crossings += count;
                if crossings % 2 == 1 {
                    *value = -*value;
                }
            }
        });
}

const SWEEP_ORDERS: [(isize, isize, isize); 8] = [
    (1, 1, 1),
    (-1, -1, -1),
    (1, 1, -1),
    (-1, -1, 1),
    (1, -1, 1),
    (-1, 1, -1),
    (1, -1, -1),
    (-1, 1, 1),
];

/// Two full Gauss-Seidel rounds over the eight axis orderings.
fn sweep_all(
    triangles: &[[u32; 3]],
    vertices: &[Point3<f32>],
    spec: &GridSpec,
    phi: &mut [f32],
    closest: &mut [u32],
) {
    for _ in 0..2 {
        for (di, dj, dk) in SWEEP_ORDERS {
            sweep(triangles, vertices, spec, phi, closest, di, dj, dk);
        }
    }
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::too_many_arguments)]
// Casts: loop indices stay within grid bounds by construction
fn sweep(
    triangles: &[[u32; 3]],
    vertices: &[Point3<f32>],
    spec: &GridSpec,
    phi: &mut [f32],
    closest: &mut [u32],
    di: isize,
    dj: isize,
    dk: isize,
) {
    let (ni, nj, nk) = (
        spec.dims.0 as isize,
        spec.dims.1 as isize,
        spec.dims.2 as isize,
    );
    let (i0, i1) = if di > 0 { (1, ni) } else { (ni - 2, -1) };
    let (j0, j1) = if dj > 0 { (1, nj) } else { (nj - 2, -1) };
    let (k0, k1) = if dk > 0 { (1, nk) } else { (nk - 2, -1) };

    let mut k = k0;
    while k != k1 {
        let mut j = j0;
        while j != j1 {
            let mut i = i0;
            while i != i1 {
                let cell = spec.index(i as usize, j as usize, k as usize);
                let gx = spec.position(i as usize, j as usize, k as usize);
                // The seven already-visited neighbors behind the sweep front
                for mask in 1u32..8 {
                    let nb_i = if mask & 1 != 0 { i - di } else { i };
                    let nb_j = if mask & 2 != 0 { j - dj } else { j };
                    let nb_k = if mask & 4 != 0 { k - dk } else { k };
                    let neighbor = spec.index(nb_i as usize, nb_j as usize, nb_k as usize);
                    relax_from(gx, cell, neighbor, triangles, vertices, phi, closest);
                }
                i += di;
            }
            j += dj;
        }
        k += dk;
    }
}

/// Adopt the neighbor's closest triangle when it tightens this cell.
///
/// The recomputed value is a true distance to that triangle; only the
/// magnitude changes, the parity-resolved sign stays.
#[inline]
fn relax_from(
    gx: Point3<f32>,
    cell: usize,
    neighbor: usize,
    triangles: &[[u32; 3]],
    vertices: &[Point3<f32>],
    phi: &mut [f32],
    closest: &mut [u32],
) {
    let t = closest[neighbor];
    if t == NO_TRIANGLE {
        return;
    }
    let tri = triangles[t as usize];
    let d = point_triangle_distance(
        gx,
        vertices[tri[0] as usize],
        vertices[tri[1] as usize],
        vertices[tri[2] as usize],
    );
    if d < phi[cell].abs() {
        phi[cell] = phi[cell].signum() * d;
        closest[cell] = t;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn unit_square_plane() -> (Vec<[u32; 3]>, Vec<Point3<f32>>) {
        // Two triangles tiling the z=0 square [0,1]^2
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let triangles = vec![[0, 1, 2], [0, 2, 3]];
        (triangles, vertices)
    }

    #[test]
    fn rejects_zero_dimension() {
        let (triangles, vertices) = unit_square_plane();
        let spec = GridSpec::new((0, 4, 4), Point3::origin(), 0.5);
        let mut phi = ScalarGrid::from_spec(&GridSpec::new((1, 1, 1), Point3::origin(), 1.0), 0.0);
        let result = make_level_set3(
            &triangles,
            &vertices,
            &spec,
            &mut phi,
            &LevelSetParams::default(),
        );
        assert!(matches!(
            result,
            Err(LevelSetError::InvalidGridDimensions { .. })
        ));
    }

    #[test]
    fn rejects_nonpositive_dx() {
        let (triangles, vertices) = unit_square_plane();
        let spec = GridSpec::new((4, 4, 4), Point3::origin(), 0.0);
        let mut phi = ScalarGrid::from_spec(&GridSpec::new((1, 1, 1), Point3::origin(), 1.0), 0.0);
        let result = make_level_set3(
            &triangles,
            &vertices,
            &spec,
            &mut phi,
            &LevelSetParams::default(),
        );
        assert!(matches!(
            result,
            Err(LevelSetError::InvalidGridDimensions { .. })
        ));
    }

    #[test]
    fn rejects_empty_mesh() {
        let spec = GridSpec::new((4, 4, 4), Point3::origin(), 0.5);
        let mut phi = ScalarGrid::from_spec(&spec, 0.0);
        let result = make_level_set3(&[], &[], &spec, &mut phi, &LevelSetParams::default());
        assert!(matches!(result, Err(LevelSetError::EmptyMesh)));
    }

    #[test]
    fn rejects_bad_index() {
        let (mut triangles, vertices) = unit_square_plane();
        triangles.push([0, 1, 99]);
        let spec = GridSpec::new((4, 4, 4), Point3::origin(), 0.5);
        let mut phi = ScalarGrid::from_spec(&spec, 0.0);
        let result = make_level_set3(
            &triangles,
            &vertices,
            &spec,
            &mut phi,
            &LevelSetParams::default(),
        );
        assert!(matches!(
            result,
            Err(LevelSetError::BadTriangleIndex {
                triangle: 2,
                index: 99,
                ..
            })
        ));
    }

    #[test]
    fn grid_untouched_on_error() {
        let spec = GridSpec::new((2, 2, 2), Point3::origin(), 1.0);
        let mut phi = ScalarGrid::from_spec(&spec, 7.0);
        let result = make_level_set3(&[], &[], &spec, &mut phi, &LevelSetParams::default());
        assert!(result.is_err());
        assert_eq!(phi.get(0, 0, 0), 7.0);
    }

    #[test]
    fn sentinel_bound_holds_everywhere() {
        let (triangles, vertices) = unit_square_plane();
        let spec = GridSpec::new((8, 8, 8), Point3::new(-1.0, -1.0, -1.0), 0.4);
        let mut phi = ScalarGrid::from_spec(&spec, 0.0);
        make_level_set3(
            &triangles,
            &vertices,
            &spec,
            &mut phi,
            &LevelSetParams {
                backend: Backend::Cpu,
                ..LevelSetParams::default()
            },
        )
        .unwrap();

        let bound = sentinel_distance(&spec);
        for &value in phi.as_slice() {
            assert!(value.abs() < bound);
        }
    }

    #[test]
    fn open_surface_distances_are_positive_magnitudes() {
        let (triangles, vertices) = unit_square_plane();
        let spec = GridSpec::new((6, 6, 6), Point3::new(-0.25, -0.25, -0.75), 0.25);
        let mut phi = ScalarGrid::from_spec(&spec, 0.0);
        make_level_set3(
            &triangles,
            &vertices,
            &spec,
            &mut phi,
            &LevelSetParams {
                backend: Backend::Cpu,
                ..LevelSetParams::default()
            },
        )
        .unwrap();

        // Sample one cell directly below the plane's center: distance to
        // the surface is the vertical gap
        let d = phi.get(3, 3, 1);
        assert!((d.abs() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn thread_count_resolution() {
        assert_eq!(thread_count(4), 4);
        assert!(thread_count(0) >= 1);
    }

    #[test]
    fn records_cpu_backend() {
        let (triangles, vertices) = unit_square_plane();
        let spec = GridSpec::new((4, 4, 4), Point3::new(-0.5, -0.5, -0.5), 0.5);
        let mut phi = ScalarGrid::from_spec(&spec, 0.0);
        make_level_set3(
            &triangles,
            &vertices,
            &spec,
            &mut phi,
            &LevelSetParams {
                backend: Backend::Cpu,
                ..LevelSetParams::default()
            },
        )
        .unwrap();
        assert_eq!(crate::last_used_backend(), Some(Backend::Cpu));
    }
}

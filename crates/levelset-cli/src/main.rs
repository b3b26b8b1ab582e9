//! Command-line signed distance field generator.
//!
//! Converts a closed triangle mesh (OBJ or STL) into a grid-based signed
//! distance field stored in the binary SDF container. The sizing
//! arguments are positional and their meaning depends on the input
//! extension:
//!
//! - `levelset model.obj <dx> <padding> [threads]` - grid spacing is
//!   given; dimensions follow from the padded mesh bounds.
//! - `levelset part.stl <Nx> [padding] [threads]` - X resolution is
//!   given; Ny and Nz preserve the mesh aspect ratio.
//! - `levelset part.stl <Nx> <Ny> <Nz> [padding] [threads]` - explicit
//!   dimensions; the spacing is chosen so the mesh fits on every axis.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;

use levelset_core::{gpu_available, last_used_backend, make_level_set3, LevelSetParams};
use levelset_io::{load_obj, load_stl, write_sdf};
use levelset_types::{Aabb, GridSpec, ScalarGrid, TriMesh};
use nalgebra::Vector3;

const LONG_ABOUT: &str = "\
Convert closed, oriented triangle meshes into grid-based signed distance fields.

Mode 1 - OBJ with explicit spacing:
    levelset <file.obj> <dx> <padding> [threads]
  dx controls the resolution; the grid covers the mesh bounds padded by
  padding cells on every side.

Mode 2a - STL with proportional dimensions:
    levelset <file.stl> <Nx> [padding] [threads]
  Ny and Nz are derived from Nx to preserve the mesh aspect ratio.

Mode 2b - STL with manual dimensions:
    levelset <file.stl> <Nx> <Ny> <Nz> [padding] [threads]
  The spacing is the largest per-axis fit so the mesh fits in the grid.

With three numeric arguments after an STL file, a second value below 20
is interpreted as a padding (mode 2a with threads), larger values as Ny
(mode 2b).

Output is a binary SDF file: a 36-byte header (dimensions and bounds)
followed by the raw float32 grid. The GPU is used automatically when one
is available.";

#[derive(Parser, Debug)]
#[command(name = "levelset")]
#[command(about = "Convert triangle meshes into signed distance fields")]
#[command(long_about = LONG_ABOUT)]
#[command(version)]
struct Cli {
    /// Input mesh file (.obj or .stl)
    input: PathBuf,

    /// Sizing arguments; their meaning depends on the input extension
    #[arg(required = true, num_args = 1..=5)]
    sizing: Vec<String>,
}

/// A fully resolved run: what to compute and where to write it.
struct Job {
    grid: GridSpec,
    num_threads: usize,
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let extension = cli
        .input
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (mesh, job) = match extension.as_str() {
        "obj" => {
            let mesh = load_obj(&cli.input)
                .with_context(|| format!("failed to load {}", cli.input.display()))?;
            let job = plan_obj_job(&cli.input, &mesh, &cli.sizing)?;
            (mesh, job)
        }
        "stl" => {
            let mesh = load_stl(&cli.input)
                .with_context(|| format!("failed to load {}", cli.input.display()))?;
            let job = plan_stl_job(&cli.input, &mesh, &cli.sizing)?;
            (mesh, job)
        }
        other => bail!("unsupported input extension '.{other}'; expected .obj or .stl"),
    };

    println!(
        "Loaded {} vertices, {} triangles from {}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        cli.input.display()
    );
    let (ni, nj, nk) = job.grid.dims;
    println!("Grid: {ni} x {nj} x {nk}, dx = {}", job.grid.dx);
    println!(
        "Bounds: ({:.4}, {:.4}, {:.4}) to ({:.4}, {:.4}, {:.4})",
        job.grid.origin.x,
        job.grid.origin.y,
        job.grid.origin.z,
        job.grid.max_corner().x,
        job.grid.max_corner().y,
        job.grid.max_corner().z,
    );
    if gpu_available() {
        println!("Hardware: GPU acceleration available");
    } else {
        println!("Hardware: CPU (multi-threaded)");
    }

    println!("Computing signed distance field...");
    let mut phi = ScalarGrid::from_spec(&job.grid, 0.0);
    make_level_set3(
        &mesh.triangles,
        &mesh.positions,
        &job.grid,
        &mut phi,
        &LevelSetParams {
            num_threads: job.num_threads,
            ..LevelSetParams::default()
        },
    )
    .context("level set computation failed")?;
    if let Some(backend) = last_used_backend() {
        println!("Backend used: {backend:?}");
    }

    write_sdf(&job.output, &phi)
        .with_context(|| format!("failed to write {}", job.output.display()))?;

    let inside = phi.as_slice().iter().filter(|&&v| v < 0.0).count();
    let total = phi.len();
    #[allow(clippy::cast_precision_loss)]
    let percent = 100.0 * inside as f64 / total as f64;
    let file_size_mb = (36 + 4 * total) as f64 / (1024.0 * 1024.0);

    println!("Wrote {}", job.output.display());
    println!("Inside cells: {inside} / {total} ({percent:.1}%)");
    println!("File size: {file_size_mb:.2} MB");
    Ok(())
}

fn mesh_bounds(mesh: &TriMesh) -> Result<Aabb> {
    mesh.bounds().context("mesh has no vertices")
}

/// Mode 1: OBJ with explicit spacing. Arguments: dx, padding, [threads].
fn plan_obj_job(input: &Path, mesh: &TriMesh, sizing: &[String]) -> Result<Job> {
    if !(2..=3).contains(&sizing.len()) {
        bail!("OBJ mode expects: <dx> <padding> [threads]");
    }
    let dx: f32 = sizing[0]
        .parse()
        .with_context(|| format!("invalid dx '{}'", sizing[0]))?;
    if !dx.is_finite() || dx <= 0.0 {
        bail!("dx must be a positive number, got {dx}");
    }
    let padding = parse_padding(&sizing[1])?;
    let num_threads = parse_threads(sizing.get(2))?;

    let bounds = mesh_bounds(mesh)?;
    #[allow(clippy::cast_precision_loss)]
    let padded = bounds.padded(padding as f32 * dx);
    let extent = padded.extent();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Truncation mirrors the grid fitting rule: cells are whole
    let dims = (
        (extent.x / dx) as usize,
        (extent.y / dx) as usize,
        (extent.z / dx) as usize,
    );

    debug!(?dims, dx, padding, "planned OBJ-mode grid");
    Ok(Job {
        grid: GridSpec::new(dims, padded.min, dx),
        num_threads,
        output: input.with_extension("sdf"),
    })
}

/// Modes 2a/2b: STL with target dimensions.
fn plan_stl_job(input: &Path, mesh: &TriMesh, sizing: &[String]) -> Result<Job> {
    let bounds = mesh_bounds(mesh)?;
    let extent = bounds.extent();

    // Three numeric arguments are ambiguous: (Nx, padding, threads) or
    // (Nx, Ny, Nz). A second value below 20 reads as a padding.
    let proportional = match sizing.len() {
        1 | 2 => true,
        3 => sizing[1].parse::<i64>().is_ok_and(|v| v < 20),
        4 | 5 => false,
        _ => bail!("STL mode expects: <Nx> [padding] [threads] or <Nx> <Ny> <Nz> [padding] [threads]"),
    };

    let (dims, dx, num_threads) = if proportional {
        let nx = parse_dimension(&sizing[0])?;
        let padding = match sizing.get(1) {
            Some(raw) => parse_padding(raw)?,
            None => 1,
        };
        let num_threads = parse_threads(sizing.get(2))?;

        if nx <= 2 * padding {
            bail!("Nx = {nx} leaves no interior cells after {padding} cells of padding");
        }
        #[allow(clippy::cast_precision_loss)]
        let dx = extent.x / (nx - 2 * padding) as f32;
        if !dx.is_finite() || dx <= 0.0 {
            bail!("mesh is flat along x; use manual dimensions");
        }
        let ny = proportional_dimension(extent.y, dx, padding);
        let nz = proportional_dimension(extent.z, dx, padding);
        debug!(nx, ny, nz, dx, "proportional STL sizing");
        ((nx, ny, nz), dx, num_threads)
    } else {
        let nx = parse_dimension(&sizing[0])?;
        let ny = parse_dimension(&sizing[1])?;
        let nz = parse_dimension(&sizing[2])?;
        let padding = match sizing.get(3) {
            Some(raw) => parse_padding(raw)?,
            None => 1,
        };
        let num_threads = parse_threads(sizing.get(4))?;

        for (n, axis) in [(nx, "x"), (ny, "y"), (nz, "z")] {
            if n <= 2 * padding {
                bail!("N{axis} = {n} leaves no interior cells after {padding} cells of padding");
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let dx = [
            extent.x / (nx - 2 * padding) as f32,
            extent.y / (ny - 2 * padding) as f32,
            extent.z / (nz - 2 * padding) as f32,
        ]
        .into_iter()
        .fold(0.0f32, f32::max);
        if !dx.is_finite() || dx <= 0.0 {
            bail!("mesh has zero extent; cannot derive a grid spacing");
        }
        debug!(nx, ny, nz, dx, "manual STL sizing");
        ((nx, ny, nz), dx, num_threads)
    };

    // Center the grid on the mesh so the target dimensions hold exactly
    #[allow(clippy::cast_precision_loss)]
    let grid_size = Vector3::new(dims.0 as f32, dims.1 as f32, dims.2 as f32) * dx;
    let center = bounds.center();
    let origin = center - grid_size * 0.5;

    let output = stl_output_name(input, dims);
    Ok(Job {
        grid: GridSpec::new(dims, origin, dx),
        num_threads,
        output,
    })
}

/// Round-half-up sizing of a dependent axis.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
// Truncation is the rounding rule itself
fn proportional_dimension(extent: f32, dx: f32, padding: usize) -> usize {
    (extent / dx + 0.5) as usize + 2 * padding
}

fn stl_output_name(input: &Path, dims: (usize, usize, usize)) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let name = format!("{stem}_sdf_{}x{}x{}.sdf", dims.0, dims.1, dims.2);
    input.with_file_name(name)
}

fn parse_dimension(raw: &str) -> Result<usize> {
    let value: i64 = raw
        .parse()
        .with_context(|| format!("invalid grid dimension '{raw}'"))?;
    if value <= 0 {
        bail!("grid dimension must be a positive integer, got {value}");
    }
    #[allow(clippy::cast_sign_loss)]
    Ok(value as usize)
}

fn parse_padding(raw: &str) -> Result<usize> {
    let value: i64 = raw
        .parse()
        .with_context(|| format!("invalid padding '{raw}'"))?;
    // Padding below one cell is floored, not rejected
    Ok(value.max(1) as usize)
}

fn parse_threads(raw: Option<&String>) -> Result<usize> {
    match raw {
        None => Ok(0),
        Some(raw) => {
            let value: i64 = raw
                .parse()
                .with_context(|| format!("invalid thread count '{raw}'"))?;
            if value < 0 {
                bail!("thread count must be non-negative, got {value}");
            }
            #[allow(clippy::cast_sign_loss)]
            Ok(value as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn flat_box_mesh(size: Vector3<f32>) -> TriMesh {
        // Two triangles spanning the diagonal of the box's base; enough
        // for bounds-driven sizing
        TriMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(size.x, 0.0, 0.0),
                Point3::new(size.x, size.y, size.z),
                Point3::new(0.0, size.y, size.z),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn obj_mode_sizes_from_dx() {
        let mesh = flat_box_mesh(Vector3::new(2.0, 1.0, 0.5));
        let job = plan_obj_job(Path::new("model.obj"), &mesh, &args(&["0.1", "2"])).unwrap();
        // Extent plus 2 * 0.2 padding on each axis, divided by dx
        assert_eq!(job.grid.dims.0, 24);
        assert_eq!(job.grid.dims.1, 14);
        assert_eq!(job.grid.dims.2, 9);
        assert_eq!(job.num_threads, 0);
        assert_eq!(job.output, PathBuf::from("model.sdf"));
    }

    #[test]
    fn obj_mode_parses_threads() {
        let mesh = flat_box_mesh(Vector3::new(1.0, 1.0, 1.0));
        let job = plan_obj_job(Path::new("m.obj"), &mesh, &args(&["0.25", "1", "8"])).unwrap();
        assert_eq!(job.num_threads, 8);
    }

    #[test]
    fn obj_mode_rejects_bad_dx() {
        let mesh = flat_box_mesh(Vector3::new(1.0, 1.0, 1.0));
        assert!(plan_obj_job(Path::new("m.obj"), &mesh, &args(&["-0.5", "1"])).is_err());
    }

    #[test]
    fn stl_proportional_preserves_aspect() {
        let mesh = flat_box_mesh(Vector3::new(4.0, 2.0, 1.0));
        let job = plan_stl_job(Path::new("part.stl"), &mesh, &args(&["42"])).unwrap();
        let (nx, ny, nz) = job.grid.dims;
        assert_eq!(nx, 42);
        // dx = 4.0 / 40 = 0.1; ny = 2.0/0.1 + 2 = 22, nz = 1.0/0.1 + 2 = 12
        assert_eq!(ny, 22);
        assert_eq!(nz, 12);
        assert_eq!(
            job.output,
            PathBuf::from("part_sdf_42x22x12.sdf")
        );
    }

    #[test]
    fn stl_three_args_small_second_is_padding() {
        let mesh = flat_box_mesh(Vector3::new(4.0, 2.0, 1.0));
        let job = plan_stl_job(Path::new("part.stl"), &mesh, &args(&["42", "2", "4"])).unwrap();
        // Mode 2a: padding 2, threads 4
        assert_eq!(job.grid.dims.0, 42);
        assert_eq!(job.num_threads, 4);
    }

    #[test]
    fn stl_three_args_large_second_is_manual_dims() {
        let mesh = flat_box_mesh(Vector3::new(4.0, 2.0, 1.0));
        let job = plan_stl_job(Path::new("part.stl"), &mesh, &args(&["40", "40", "40"])).unwrap();
        assert_eq!(job.grid.dims, (40, 40, 40));
        // dx fits the largest axis: 4.0 / 38
        assert!((job.grid.dx - 4.0 / 38.0).abs() < 1e-6);
    }

    #[test]
    fn stl_manual_grid_is_centered() {
        let mesh = flat_box_mesh(Vector3::new(4.0, 2.0, 1.0));
        let job = plan_stl_job(Path::new("part.stl"), &mesh, &args(&["40", "30", "20"])).unwrap();
        let min = job.grid.origin;
        let max = job.grid.max_corner();
        // The mesh center coincides with the grid center
        assert!((min.x + max.x - 4.0).abs() < 1e-5);
        assert!((min.y + max.y - 2.0).abs() < 1e-5);
        assert!((min.z + max.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn stl_rejects_overpadded_dimensions() {
        let mesh = flat_box_mesh(Vector3::new(4.0, 2.0, 1.0));
        assert!(plan_stl_job(Path::new("part.stl"), &mesh, &args(&["4", "2"])).is_err());
    }

    #[test]
    fn padding_is_floored_at_one() {
        assert_eq!(parse_padding("0").unwrap(), 1);
        assert_eq!(parse_padding("-3").unwrap(), 1);
        assert_eq!(parse_padding("5").unwrap(), 5);
    }
}

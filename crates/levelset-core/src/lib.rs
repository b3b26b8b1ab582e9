//! Signed distance field computation from triangle meshes.
//!
//! Given a closed, oriented triangle mesh and a uniform grid, this crate
//! computes at every grid sample the signed Euclidean distance to the
//! nearest triangle: negative inside, positive outside, zero on the
//! surface. The result feeds simulation, rendering, CSG, and collision
//! pipelines.
//!
//! The kernel runs in two phases: an exact narrow-band pass around the
//! surface, then fast-sweeping propagation to the far field. Signs come
//! from ray-crossing parity. [`make_level_set3`] is the entry point.
//!
//! # Example
//!
//! ```
//! use levelset_core::{make_level_set3, LevelSetParams};
//! use levelset_types::{GridSpec, ScalarGrid};
//! use nalgebra::Point3;
//!
//! // A single triangle (open surface: magnitudes are meaningful,
//! // signs need a closed mesh)
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let triangles = vec![[0, 1, 2]];
//!
//! let spec = GridSpec::new((8, 8, 8), Point3::new(-0.5, -0.5, -0.5), 0.25);
//! let mut phi = ScalarGrid::from_spec(&spec, 0.0);
//! make_level_set3(&triangles, &vertices, &spec, &mut phi, &LevelSetParams::default())?;
//! # Ok::<(), levelset_core::LevelSetError>(())
//! ```
//!
//! # Feature Flags
//!
//! - `gpu`: enables the wgpu compute backend. Without it,
//!   [`Backend::Gpu`] requests fail with
//!   [`LevelSetError::BackendUnavailable`] and `Auto` always resolves to
//!   the CPU.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod backend;
mod error;
pub mod geometry;
mod kernel;

pub use backend::{gpu_available, last_used_backend, Backend};
pub use error::{LevelSetError, LevelSetResult};
pub use kernel::{make_level_set3, LevelSetParams};

pub use levelset_types::{Aabb, GridSpec, ScalarGrid, TriMesh};

//! Shared vocabulary types for signed distance field generation.
//!
//! This crate defines the mesh and grid types used across the levelset
//! workspace:
//!
//! - [`TriMesh`] - an indexed triangle mesh in world coordinates
//! - [`Aabb`] - an axis-aligned bounding box
//! - [`GridSpec`] - the descriptor of a uniform sample grid
//! - [`ScalarGrid`] - a dense 3D grid of `f32` samples
//!
//! It has no dependencies beyond nalgebra and can be used from CLI tools,
//! servers, and compute backends alike.
//!
//! # Example
//!
//! ```
//! use levelset_types::{GridSpec, ScalarGrid, TriMesh};
//! use nalgebra::Point3;
//!
//! let mut mesh = TriMesh::new();
//! mesh.positions.push(Point3::new(0.0, 0.0, 0.0));
//! mesh.positions.push(Point3::new(1.0, 0.0, 0.0));
//! mesh.positions.push(Point3::new(0.0, 1.0, 0.0));
//! mesh.triangles.push([0, 1, 2]);
//!
//! let spec = GridSpec::new((8, 8, 8), Point3::new(-1.0, -1.0, -1.0), 0.25);
//! let grid = ScalarGrid::from_spec(&spec, 0.0);
//! assert_eq!(grid.len(), 512);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod grid;
mod mesh;

pub use bounds::Aabb;
pub use grid::{GridSpec, ScalarGrid};
pub use mesh::TriMesh;

pub use nalgebra::{Point3, Vector3};

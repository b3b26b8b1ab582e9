//! Mesh and SDF file I/O for the levelset workspace.
//!
//! This crate loads triangle meshes in the two formats the distance field
//! tool consumes, and reads/writes the binary SDF container the tool
//! produces:
//!
//! - **OBJ** (Wavefront) - text, triangles and fan-triangulated polygons
//! - **STL** (stereolithography) - binary and ASCII with auto-detection
//! - **SDF container** - 36-byte header plus a raw f32 grid
//!
//! # Example
//!
//! ```no_run
//! use levelset_io::{load_stl, write_sdf};
//! use levelset_types::{GridSpec, ScalarGrid};
//! use nalgebra::Point3;
//!
//! let mesh = load_stl("part.stl").unwrap();
//! println!("{} triangles", mesh.triangle_count());
//!
//! let spec = GridSpec::new((32, 32, 32), Point3::origin(), 0.1);
//! let phi = ScalarGrid::from_spec(&spec, 0.0);
//! write_sdf("part.sdf", &phi).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod obj;
mod sdf_file;
mod stl;

pub use error::{IoError, IoResult};
pub use obj::load_obj;
pub use sdf_file::{read_sdf, write_sdf};
pub use stl::load_stl;

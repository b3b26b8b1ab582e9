//! GPU-accelerated signed distance field computation.
//!
//! This crate provides a wgpu compute backend for level set generation.
//! One shader invocation per grid cell computes the exact distance to the
//! nearest triangle and the ray-parity sign, so the GPU path needs no
//! separate propagation phase.
//!
//! Device discovery is lazy and process-wide: the first use requests an
//! adapter, and [`GpuContext::is_available`] reports the outcome without
//! panicking on GPU-less machines.
//!
//! # Example
//!
//! ```no_run
//! use levelset_gpu::{compute_level_set, GpuContext};
//! use levelset_types::GridSpec;
//! use nalgebra::Point3;
//!
//! if GpuContext::is_available() {
//!     let vertices = vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ];
//!     let triangles = vec![[0u32, 1, 2]];
//!     let spec = GridSpec::new((32, 32, 32), Point3::new(-1.0, -1.0, -1.0), 0.0625);
//!     let values = compute_level_set(&triangles, &vertices, &spec).unwrap();
//!     println!("{} cells", values.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod buffers;
mod context;
mod error;
mod pipeline;

pub use context::{GpuAdapterInfo, GpuContext};
pub use error::{GpuError, GpuResult};
pub use pipeline::{compute_level_set, LevelSetPipeline};

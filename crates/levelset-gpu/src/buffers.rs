//! GPU buffer types for mesh and grid data.
//!
//! # Memory Layout
//!
//! GPU data types use 16-byte alignment for efficient access:
//! - [`GpuTriangle`]: 48 bytes (3 x vec4)
//! - [`GpuGridParams`]: 48 bytes (aligned for uniform buffers)

use bytemuck::{Pod, Zeroable};
use nalgebra::Point3;
use wgpu::util::DeviceExt;
use wgpu::{Buffer, BufferUsages};

use levelset_types::GridSpec;

use crate::context::GpuContext;
use crate::error::{GpuError, GpuResult};

/// GPU-friendly triangle with vec4-aligned vertex positions.
///
/// The fourth component of each vertex is padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuTriangle {
    /// First vertex position (xyz) + padding.
    pub v0: [f32; 4],
    /// Second vertex position (xyz) + padding.
    pub v1: [f32; 4],
    /// Third vertex position (xyz) + padding.
    pub v2: [f32; 4],
}

impl GpuTriangle {
    /// Create a GPU triangle from vertex positions.
    #[must_use]
    pub const fn new(v0: [f32; 3], v1: [f32; 3], v2: [f32; 3]) -> Self {
        Self {
            v0: [v0[0], v0[1], v0[2], 0.0],
            v1: [v1[0], v1[1], v1[2], 0.0],
            v2: [v2[0], v2[1], v2[2], 0.0],
        }
    }
}

/// Uniform parameters describing the sample grid.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuGridParams {
    /// Grid origin (xyz) + padding.
    pub origin: [f32; 4],
    /// Grid dimensions (ni, nj, nk) + padding.
    pub dims: [u32; 4],
    /// Cell spacing in world units.
    pub dx: f32,
    /// Number of triangles in the mesh.
    pub triangle_count: u32,
    /// Padding for 16-byte alignment.
    _padding: [f32; 2],
}

impl GpuGridParams {
    /// Create grid parameters from a grid descriptor.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: grid dimensions beyond u32 are rejected by buffer limits first
    pub fn new(spec: &GridSpec, triangle_count: u32) -> Self {
        Self {
            origin: [spec.origin.x, spec.origin.y, spec.origin.z, 0.0],
            dims: [
                spec.dims.0 as u32,
                spec.dims.1 as u32,
                spec.dims.2 as u32,
                0,
            ],
            dx: spec.dx,
            triangle_count,
            _padding: [0.0, 0.0],
        }
    }
}

/// Device-resident mesh geometry.
pub struct MeshBuffers {
    /// Storage buffer of [`GpuTriangle`] records.
    pub triangles: Buffer,
    /// Number of triangles uploaded.
    pub triangle_count: u32,
}

impl MeshBuffers {
    /// Upload mesh geometry, dereferencing the index list.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::MeshTooLarge`] when the triangle buffer would
    /// exceed the device's storage limits.
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: triangle count bounded by the storage limit check
    pub fn upload(
        ctx: &GpuContext,
        triangles: &[[u32; 3]],
        vertices: &[Point3<f32>],
    ) -> GpuResult<Self> {
        let max_triangles =
            ctx.max_storage_buffer_size() as usize / std::mem::size_of::<GpuTriangle>();
        if triangles.len() > max_triangles {
            return Err(GpuError::MeshTooLarge {
                triangles: triangles.len(),
                max: max_triangles,
            });
        }

        let records: Vec<GpuTriangle> = triangles
            .iter()
            .map(|tri| {
                let v0 = vertices[tri[0] as usize];
                let v1 = vertices[tri[1] as usize];
                let v2 = vertices[tri[2] as usize];
                GpuTriangle::new(
                    [v0.x, v0.y, v0.z],
                    [v1.x, v1.y, v1.z],
                    [v2.x, v2.y, v2.z],
                )
            })
            .collect();

        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("levelset_triangles"),
                contents: bytemuck::cast_slice(&records),
                usage: BufferUsages::STORAGE,
            });

        Ok(Self {
            triangles: buffer,
            triangle_count: triangles.len() as u32,
        })
    }
}

/// Device-resident grid parameter and value buffers.
pub struct GridBuffers {
    /// Uniform buffer holding [`GpuGridParams`].
    pub params: Buffer,
    /// Storage buffer of output distances.
    pub values: Buffer,
    /// Total number of cells.
    pub cell_count: usize,
}

impl GridBuffers {
    /// Allocate buffers for the given grid.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::GridTooLarge`] when the value buffer would
    /// exceed the device's storage limits.
    pub fn allocate(ctx: &GpuContext, spec: &GridSpec, triangle_count: u32) -> GpuResult<Self> {
        let cell_count = spec.cell_count();
        let max_cells = ctx.max_storage_buffer_size() as usize / std::mem::size_of::<f32>();
        if cell_count > max_cells {
            return Err(GpuError::GridTooLarge {
                dims: spec.dims,
                total: cell_count,
                max: max_cells,
            });
        }

        let grid_params = GpuGridParams::new(spec, triangle_count);
        let params = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("levelset_grid_params"),
                contents: bytemuck::bytes_of(&grid_params),
                usage: BufferUsages::UNIFORM,
            });

        let values = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("levelset_values"),
            size: (cell_count * std::mem::size_of::<f32>()) as u64,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        Ok(Self {
            params,
            values,
            cell_count,
        })
    }

    /// Download the computed values to host memory.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::BufferMapping`] when the readback fails.
    pub fn download_values(&self, ctx: &GpuContext) -> GpuResult<Vec<f32>> {
        let size = self.values.size();
        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("levelset_staging"),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("levelset_download"),
            });
        encoder.copy_buffer_to_buffer(&self.values, 0, &staging, 0, size);
        ctx.queue.submit([encoder.finish()]);

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        ctx.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| GpuError::BufferMapping("channel closed".into()))?
            .map_err(|e| GpuError::BufferMapping(format!("{e:?}")))?;

        let data = slice.get_mapped_range();
        let values: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();

        Ok(values)
    }
}

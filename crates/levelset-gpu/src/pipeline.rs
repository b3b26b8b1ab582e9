//! Compute pipeline for GPU level set generation.
//!
//! One shader invocation per grid cell scans every triangle, keeping the
//! exact minimum distance and a ray-crossing count whose parity yields
//! the sign. Unlike the CPU kernel there is no narrow band: every cell's
//! distance is exact, which subsumes any band width.

use tracing::{debug, info};
use wgpu::{BindGroupLayout, ComputePipeline, ShaderModule};

use levelset_types::GridSpec;
use nalgebra::Point3;

use crate::buffers::{GridBuffers, MeshBuffers};
use crate::context::GpuContext;
use crate::error::GpuResult;

/// Shader source for level set computation.
const LEVEL_SET_SHADER: &str = include_str!("shaders/level_set.wgsl");

/// Cached compute pipeline for level set generation.
///
/// Creating the pipeline compiles the shader; reuse it when computing
/// several fields in one process.
pub struct LevelSetPipeline {
    #[allow(dead_code)] // Kept alive with the pipeline it backs
    shader: ShaderModule,
    pipeline: ComputePipeline,
    bind_group_layout: BindGroupLayout,
}

impl LevelSetPipeline {
    /// Create the compute pipeline.
    ///
    /// # Errors
    ///
    /// Currently infallible beyond panics inside wgpu validation; kept
    /// fallible for parity with the rest of the GPU surface.
    pub fn new(ctx: &GpuContext) -> GpuResult<Self> {
        debug!("creating level set compute pipeline");

        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("level_set_compute"),
                source: wgpu::ShaderSource::Wgsl(LEVEL_SET_SHADER.into()),
            });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("level_set_bind_group_layout"),
                    entries: &[
                        // Triangles (read-only storage)
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: true },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        // Grid parameters (uniform)
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        // Output values (read-write storage)
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: false },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("level_set_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("level_set_pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("level_set"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        Ok(Self {
            shader,
            pipeline,
            bind_group_layout,
        })
    }

    /// Run the kernel for an uploaded mesh over the given grid.
    ///
    /// Returns distances in the i-fastest layout used by `ScalarGrid`.
    ///
    /// # Errors
    ///
    /// Returns an error when buffer allocation or readback fails.
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: cell counts are bounded by the storage limit check
    pub fn compute(
        &self,
        ctx: &GpuContext,
        mesh: &MeshBuffers,
        spec: &GridSpec,
    ) -> GpuResult<Vec<f32>> {
        let grid = GridBuffers::allocate(ctx, spec, mesh.triangle_count)?;

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("level_set_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: mesh.triangles.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: grid.params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: grid.values.as_entire_binding(),
                },
            ],
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("level_set_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("level_set_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let workgroups = (grid.cell_count as u32).div_ceil(256);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        ctx.queue.submit([encoder.finish()]);

        grid.download_values(ctx)
    }
}

/// Compute a signed distance field on the GPU.
///
/// Every cell receives the exact distance to the nearest triangle with
/// the sign recovered from ray-crossing parity; the caller is expected
/// to have validated the inputs.
///
/// # Errors
///
/// - [`crate::GpuError::NotAvailable`] when no device is usable
/// - [`crate::GpuError::MeshTooLarge`] / [`crate::GpuError::GridTooLarge`]
///   when buffers exceed device limits
/// - [`crate::GpuError::BufferMapping`] when the readback fails
///
/// # Example
///
/// ```no_run
/// use levelset_gpu::compute_level_set;
/// use levelset_types::GridSpec;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let triangles = vec![[0u32, 1, 2]];
/// let spec = GridSpec::new((16, 16, 16), Point3::new(-1.0, -1.0, -1.0), 0.125);
///
/// match compute_level_set(&triangles, &vertices, &spec) {
///     Ok(values) => println!("{} cells", values.len()),
///     Err(e) => eprintln!("GPU error: {e}"),
/// }
/// ```
pub fn compute_level_set(
    triangles: &[[u32; 3]],
    vertices: &[Point3<f32>],
    spec: &GridSpec,
) -> GpuResult<Vec<f32>> {
    let ctx = GpuContext::try_get()?;

    info!(
        triangles = triangles.len(),
        dims = ?spec.dims,
        "computing level set on GPU"
    );

    let mesh = MeshBuffers::upload(ctx, triangles, vertices)?;
    let pipeline = LevelSetPipeline::new(ctx)?;
    pipeline.compute(ctx, &mesh, spec)
}

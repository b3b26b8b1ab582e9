//! GPU context management.
//!
//! Lazy initialization of the wgpu device and queue with availability
//! detection. The context is a process-wide singleton; the first access
//! requests an adapter and either succeeds for the rest of the process
//! or permanently reports unavailability.

use std::sync::OnceLock;

use tracing::{debug, info, warn};
use wgpu::{Device, DeviceDescriptor, Instance, Queue, RequestAdapterOptions};

use crate::error::{GpuError, GpuResult};

/// Global GPU context, lazily initialized on first access.
static GPU_CONTEXT: OnceLock<Option<GpuContext>> = OnceLock::new();

/// Information about the selected GPU adapter.
#[derive(Debug, Clone)]
pub struct GpuAdapterInfo {
    /// Device name (e.g., "NVIDIA RTX 3080").
    pub name: String,
    /// Device type (e.g., Discrete, Integrated).
    pub device_type: String,
    /// Backend API (e.g., Vulkan, Metal, Dx12).
    pub backend: String,
}

impl From<wgpu::AdapterInfo> for GpuAdapterInfo {
    fn from(info: wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name,
            device_type: format!("{:?}", info.device_type),
            backend: format!("{:?}", info.backend),
        }
    }
}

/// GPU context containing device, queue, and adapter information.
///
/// # Example
///
/// ```no_run
/// use levelset_gpu::GpuContext;
///
/// if let Some(ctx) = GpuContext::get() {
///     println!("GPU: {}", ctx.adapter_info.name);
/// } else {
///     println!("no GPU available");
/// }
/// ```
pub struct GpuContext {
    /// The wgpu device for creating resources and pipelines.
    pub device: Device,
    /// The command queue for submitting work.
    pub queue: Queue,
    /// Information about the GPU adapter.
    pub adapter_info: GpuAdapterInfo,
    /// Device limits for resource allocation.
    pub limits: wgpu::Limits,
}

impl GpuContext {
    /// Get or initialize the global GPU context.
    ///
    /// Returns `None` when no usable device is present.
    #[must_use]
    pub fn get() -> Option<&'static Self> {
        GPU_CONTEXT
            .get_or_init(|| match pollster::block_on(Self::try_init()) {
                Ok(ctx) => {
                    info!(
                        adapter = %ctx.adapter_info.name,
                        backend = %ctx.adapter_info.backend,
                        "GPU context initialized"
                    );
                    Some(ctx)
                }
                Err(e) => {
                    warn!("GPU initialization failed: {}", e);
                    None
                }
            })
            .as_ref()
    }

    /// Get the global GPU context, or an error when unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::NotAvailable`] when no device is usable.
    pub fn try_get() -> GpuResult<&'static Self> {
        Self::get().ok_or(GpuError::NotAvailable)
    }

    /// Check whether a GPU is available.
    ///
    /// Initializes the context on first call to determine availability.
    #[must_use]
    pub fn is_available() -> bool {
        Self::get().is_some()
    }

    /// Maximum storage buffer size supported by the device, in bytes.
    #[must_use]
    pub fn max_storage_buffer_size(&self) -> u64 {
        u64::from(self.limits.max_storage_buffer_binding_size)
    }

    async fn try_init() -> GpuResult<Self> {
        debug!("initializing GPU context");

        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(GpuError::NotAvailable)?;

        let adapter_info = adapter.get_info();
        debug!(
            name = %adapter_info.name,
            device_type = ?adapter_info.device_type,
            backend = ?adapter_info.backend,
            "GPU adapter found"
        );

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("levelset-gpu"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| GpuError::Execution(format!("device request failed: {e}")))?;

        let limits = device.limits();
        Ok(Self {
            device,
            queue,
            adapter_info: adapter_info.into(),
            limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_is_stable() {
        // Whatever the answer, repeated probes must agree
        let first = GpuContext::is_available();
        let second = GpuContext::is_available();
        assert_eq!(first, second);
    }

    #[test]
    fn try_get_matches_availability() {
        if GpuContext::is_available() {
            assert!(GpuContext::try_get().is_ok());
        } else {
            assert!(matches!(GpuContext::try_get(), Err(GpuError::NotAvailable)));
        }
    }
}

//! Hardware backend selection and diagnostics.
//!
//! The kernel can run on the multi-threaded CPU path or, when the crate
//! is built with the `gpu` feature, on a wgpu compute device. [`Backend`]
//! selects between them; `Auto` resolves at call time.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{LevelSetError, LevelSetResult};

/// Hardware backend selection for level set generation.
///
/// # Example
///
/// ```
/// use levelset_core::Backend;
///
/// assert_eq!(Backend::default(), Backend::Auto);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Use the GPU when a usable device is present, otherwise the CPU.
    #[default]
    Auto,
    /// Force the multi-threaded CPU implementation.
    Cpu,
    /// Force the GPU implementation; fails when no device is usable.
    Gpu,
}

/// A [`Backend`] request with `Auto` already resolved.
pub(crate) enum ResolvedBackend {
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu,
}

const LAST_NONE: u8 = 0;
const LAST_CPU: u8 = 1;
const LAST_GPU: u8 = 2;

/// Which backend the kernel last dispatched to. Diagnostic only.
static LAST_USED: AtomicU8 = AtomicU8::new(LAST_NONE);

/// Check whether the GPU backend can be used.
///
/// Always `false` when the crate is built without the `gpu` feature.
/// With the feature enabled this probes (and lazily initializes) the
/// global GPU context.
#[must_use]
pub fn gpu_available() -> bool {
    #[cfg(feature = "gpu")]
    {
        levelset_gpu::GpuContext::is_available()
    }
    #[cfg(not(feature = "gpu"))]
    {
        false
    }
}

/// The backend used by the most recent kernel call, if any.
///
/// Reported for diagnostics; it has no effect on computation.
#[must_use]
pub fn last_used_backend() -> Option<Backend> {
    match LAST_USED.load(Ordering::Relaxed) {
        LAST_CPU => Some(Backend::Cpu),
        LAST_GPU => Some(Backend::Gpu),
        _ => None,
    }
}

pub(crate) fn record_last_used(backend: Backend) {
    let value = match backend {
        Backend::Cpu => LAST_CPU,
        Backend::Gpu => LAST_GPU,
        Backend::Auto => LAST_NONE,
    };
    LAST_USED.store(value, Ordering::Relaxed);
}

pub(crate) fn resolve(requested: Backend) -> LevelSetResult<ResolvedBackend> {
    match requested {
        Backend::Cpu => Ok(ResolvedBackend::Cpu),
        Backend::Auto => {
            #[cfg(feature = "gpu")]
            if gpu_available() {
                return Ok(ResolvedBackend::Gpu);
            }
            Ok(ResolvedBackend::Cpu)
        }
        Backend::Gpu => {
            #[cfg(feature = "gpu")]
            {
                if gpu_available() {
                    Ok(ResolvedBackend::Gpu)
                } else {
                    Err(LevelSetError::BackendUnavailable {
                        reason: "no usable GPU adapter found".into(),
                    })
                }
            }
            #[cfg(not(feature = "gpu"))]
            {
                Err(LevelSetError::BackendUnavailable {
                    reason: "built without GPU support".into(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_always_resolves() {
        assert!(matches!(resolve(Backend::Cpu), Ok(ResolvedBackend::Cpu)));
    }

    #[cfg(not(feature = "gpu"))]
    #[test]
    fn gpu_unavailable_without_feature() {
        assert!(!gpu_available());
        assert!(matches!(
            resolve(Backend::Gpu),
            Err(LevelSetError::BackendUnavailable { .. })
        ));
    }

    #[cfg(not(feature = "gpu"))]
    #[test]
    fn auto_falls_back_to_cpu() {
        assert!(matches!(resolve(Backend::Auto), Ok(ResolvedBackend::Cpu)));
    }

    #[test]
    fn last_used_round_trips() {
        record_last_used(Backend::Cpu);
        assert_eq!(last_used_backend(), Some(Backend::Cpu));
    }
}

//! Error types for level set computation.

use thiserror::Error;

/// Result type for level set computation.
pub type LevelSetResult<T> = Result<T, LevelSetError>;

/// Errors that can occur during level set computation.
///
/// Validation errors are raised at the call boundary before any work
/// begins; the kernel never returns a partially populated grid.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LevelSetError {
    /// Grid dimensions or spacing are unusable.
    #[error("invalid grid dimensions: {ni}x{nj}x{nk} with dx {dx}")]
    InvalidGridDimensions {
        /// Requested size along i.
        ni: usize,
        /// Requested size along j.
        nj: usize,
        /// Requested size along k.
        nk: usize,
        /// Requested cell spacing.
        dx: f32,
    },

    /// Mesh has no vertices or no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// A triangle references a vertex index past the end of the vertex list.
    #[error("triangle {triangle} references vertex {index}, but only {vertex_count} vertices exist")]
    BadTriangleIndex {
        /// Index of the offending triangle.
        triangle: usize,
        /// The out-of-range vertex index.
        index: u32,
        /// Number of vertices supplied.
        vertex_count: usize,
    },

    /// The requested hardware backend cannot be used.
    #[error("requested backend is unavailable: {reason}")]
    BackendUnavailable {
        /// Why the backend could not be used.
        reason: String,
    },

    /// GPU execution failed after dispatch.
    #[error("GPU execution failed: {0}")]
    Gpu(String),
}

#[cfg(feature = "gpu")]
impl From<levelset_gpu::GpuError> for LevelSetError {
    fn from(err: levelset_gpu::GpuError) -> Self {
        match err {
            levelset_gpu::GpuError::NotAvailable => Self::BackendUnavailable {
                reason: err.to_string(),
            },
            other => Self::Gpu(other.to_string()),
        }
    }
}

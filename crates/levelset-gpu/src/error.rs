//! GPU error types.

use thiserror::Error;

/// Errors that can occur during GPU level set computation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GpuError {
    /// No compatible GPU device is available on this system.
    #[error("GPU not available: no compatible device found")]
    NotAvailable,

    /// The grid exceeds the device's buffer limits.
    #[error("grid too large for GPU: {dims:?} cells ({total} total), max supported: {max}")]
    GridTooLarge {
        /// Requested grid dimensions.
        dims: (usize, usize, usize),
        /// Total number of cells.
        total: usize,
        /// Maximum supported cells.
        max: usize,
    },

    /// The mesh exceeds the device's buffer limits.
    #[error("mesh too large for GPU: {triangles} triangles, max supported: {max}")]
    MeshTooLarge {
        /// Number of triangles in the mesh.
        triangles: usize,
        /// Maximum supported triangles.
        max: usize,
    },

    /// Reading results back from the device failed.
    #[error("buffer mapping failed: {0}")]
    BufferMapping(String),

    /// Command submission or execution failed.
    #[error("GPU execution failed: {0}")]
    Execution(String),
}

/// Result type for GPU operations.
pub type GpuResult<T> = Result<T, GpuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_available() {
        assert!(format!("{}", GpuError::NotAvailable).contains("not available"));
    }

    #[test]
    fn display_grid_too_large() {
        let err = GpuError::GridTooLarge {
            dims: (512, 512, 512),
            total: 134_217_728,
            max: 33_554_432,
        };
        let msg = format!("{err}");
        assert!(msg.contains("512"));
        assert!(msg.contains("134217728"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GpuError>();
    }
}

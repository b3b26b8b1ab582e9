//! Error types for mesh and SDF file I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while reading or writing files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Malformed mesh file content.
    #[error("mesh parse error: {message}")]
    MeshParse {
        /// Description of what was malformed.
        message: String,
    },

    /// File ended before the expected amount of data.
    #[error("unexpected end of file after {position} bytes")]
    UnexpectedEof {
        /// Bytes successfully consumed before the end.
        position: u64,
    },

    /// Invalid SDF container header.
    #[error("invalid SDF header: {message}")]
    InvalidSdfHeader {
        /// Description of what was invalid.
        message: String,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Float parsing error.
    #[error("float parsing error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// Integer parsing error.
    #[error("integer parsing error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
}

impl IoError {
    /// Create a `MeshParse` error with the given message.
    #[must_use]
    pub fn mesh_parse(message: impl Into<String>) -> Self {
        Self::MeshParse {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mesh_parse() {
        let err = IoError::mesh_parse("face has 2 vertices");
        assert!(format!("{err}").contains("face has 2 vertices"));
    }

    #[test]
    fn display_unexpected_eof() {
        let err = IoError::UnexpectedEof { position: 120 };
        assert!(format!("{err}").contains("120"));
    }

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = IoError::from(io);
        assert!(matches!(err, IoError::Io(_)));
    }
}

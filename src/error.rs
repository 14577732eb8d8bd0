//! Error types for the CRI translation helpers.

use crate::os::FifoAccess;
use std::path::PathBuf;

/// Result type alias for CRI helper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by injected collaborators (health endpoint, network
/// plugin).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which process stream a FIFO carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Container input, written by the shim.
    Stdin,
    /// Container output, read by the shim.
    Stdout,
    /// Container error output, read by the shim.
    Stderr,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Errors that can occur in the CRI helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Image Errors
    // =========================================================================
    /// Failed to parse image reference.
    #[error("invalid image reference '{reference}': {reason}")]
    InvalidImageReference { reference: String, reason: String },

    /// Content digest is not `<algorithm>:<hex>`.
    #[error("invalid digest '{digest}': {reason}")]
    InvalidDigest { digest: String, reason: String },

    // =========================================================================
    // Streaming Errors
    // =========================================================================
    /// Opening a streaming FIFO failed. Pipes opened earlier in the same
    /// call have already been closed.
    #[error("failed to open {stream} fifo {path}: {source}")]
    PipeOpenFailed {
        stream: StreamKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS capability returned a handle with the wrong direction.
    #[error("fifo {path} opened with unexpected direction, expected {expected}")]
    PipeDirectionMismatch {
        path: PathBuf,
        expected: FifoAccess,
    },

    // =========================================================================
    // Cancellation
    // =========================================================================
    /// Caller cancelled the operation while it was blocked.
    #[error("operation cancelled: {operation}")]
    Cancelled { operation: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Service configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if this error was caused by caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

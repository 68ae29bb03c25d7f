//! Connector error types.
//!
//! Sink failures stay inside the pipeline: they travel the completion
//! channel and surface as a failed push status, never as a start-path
//! error. Upstream stream errors pass through transparently so the
//! original cause message is preserved end to end.

use thiserror::Error;

use spillway_core::streaming::BoxError;

/// Result alias for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors raised by destinations and sinks.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The destination rejected or failed to open the target path.
    #[error("open error: {0}")]
    Open(String),

    /// Writing a byte chunk to the destination failed.
    #[error("write error: {0}")]
    Write(String),

    /// An I/O error from the underlying storage.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The incoming byte stream terminated with an error. Passed
    /// through transparently: the display of this variant is the
    /// display of the original cause.
    #[error(transparent)]
    Upstream(BoxError),
}

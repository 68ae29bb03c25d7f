//! Push error taxonomy.
//!
//! Start-path failures are values returned to the caller. Pipeline
//! failures (evaluator, renderer, sink) never appear here; they travel
//! the completion channel and surface as
//! [`PushStatus::Failed`](crate::types::PushStatus) in the status
//! records.

use thiserror::Error;

use spillway_connectors::{DestinationTypeId, ResultType};

use crate::types::{DestinationId, TableId};

/// Result alias for push operations.
pub type PushResult<T> = Result<T, PushError>;

/// Errors reported by the controller's start and cancel paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// No destination is registered under the id.
    #[error("destination {0} not found")]
    DestinationNotFound(DestinationId),

    /// No table is registered under the id.
    #[error("table {0} not found")]
    TableNotFound(TableId),

    /// The destination has no sink for the requested format.
    #[error("destination type {0} does not support {1} results")]
    FormatNotSupported(DestinationTypeId, ResultType),

    /// A push for the same table and destination is still running.
    #[error("a push for table {0} to destination {1} is already running")]
    PushAlreadyRunning(TableId, DestinationId),
}

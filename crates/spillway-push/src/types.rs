//! Push data model: identifiers, table references, specs, and records.

use std::fmt;

use arrow_schema::SchemaRef;
use chrono::{DateTime, Utc};

use spillway_connectors::ResultType;
use spillway_core::job::JobError;

/// Opaque handle of a table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u64);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestinationId(pub u64);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Admission key of a push: at most one push runs per
/// `(table, destination)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushKey {
    /// Source table.
    pub table: TableId,
    /// Target destination.
    pub destination: DestinationId,
}

impl PushKey {
    /// Creates a key.
    #[must_use]
    pub fn new(table: TableId, destination: DestinationId) -> Self {
        Self { table, destination }
    }
}

impl fmt::Display for PushKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table, self.destination)
    }
}

/// A table definition resolved from the table store.
#[derive(Debug, Clone)]
pub struct TableRef {
    /// Table name.
    pub name: String,
    /// Query evaluated when the table is pushed.
    pub query: String,
    /// Column layout of the query result.
    pub schema: SchemaRef,
}

/// Configuration of one push, recorded at admission.
#[derive(Debug, Clone)]
pub struct PushSpec {
    /// Columns requested by the caller.
    pub columns: SchemaRef,
    /// Path at the destination that receives the output.
    pub destination_path: String,
    /// Serialization format.
    pub format: ResultType,
    /// Maximum number of rows to push, `None` for all.
    pub limit: Option<u64>,
}

/// Lifecycle status of a push.
///
/// `Running` transitions exactly once into one of the terminal
/// variants; a later push for the same key replaces the record rather
/// than mutating the status again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// The push is streaming.
    Running {
        /// Admission time.
        since: DateTime<Utc>,
    },
    /// The push delivered its full result.
    Finished {
        /// Admission time.
        since: DateTime<Utc>,
        /// Completion time.
        until: DateTime<Utc>,
    },
    /// The push was cancelled; output delivered before the signal
    /// stays at the destination.
    Canceled {
        /// Admission time.
        since: DateTime<Utc>,
        /// Cancellation time.
        until: DateTime<Utc>,
    },
    /// The push terminated with an error.
    Failed {
        /// Admission time.
        since: DateTime<Utc>,
        /// Failure time.
        until: DateTime<Utc>,
        /// What went wrong.
        cause: JobError,
    },
}

impl PushStatus {
    /// Whether this status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PushStatus::Running { .. })
    }

    /// Admission timestamp carried by every variant.
    #[must_use]
    pub fn since(&self) -> DateTime<Utc> {
        match self {
            PushStatus::Running { since }
            | PushStatus::Finished { since, .. }
            | PushStatus::Canceled { since, .. }
            | PushStatus::Failed { since, .. } => *since,
        }
    }

    /// Completion timestamp, when terminal.
    #[must_use]
    pub fn until(&self) -> Option<DateTime<Utc>> {
        match self {
            PushStatus::Running { .. } => None,
            PushStatus::Finished { until, .. }
            | PushStatus::Canceled { until, .. }
            | PushStatus::Failed { until, .. } => Some(*until),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            PushStatus::Running { .. } => "running",
            PushStatus::Finished { .. } => "finished",
            PushStatus::Canceled { .. } => "canceled",
            PushStatus::Failed { .. } => "failed",
        }
    }
}

/// Metadata describing one push, current or historical.
#[derive(Debug, Clone)]
pub struct PushRecord {
    /// Configuration the push was admitted with.
    pub spec: PushSpec,
    /// Admission time.
    pub started_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: PushStatus,
}

//! Query evaluation seam.

use async_trait::async_trait;

use spillway_core::streaming::{BoxError, RowStream};

/// Produces the lazy row stream of a query.
#[async_trait]
pub trait QueryEvaluator: Send + Sync {
    /// Evaluates `query`, returning its row stream.
    ///
    /// May fail before producing the stream; the stream itself may
    /// fail mid-way by yielding a terminal `Err` item. Dropping the
    /// stream cancels evaluation.
    async fn evaluate(&self, query: &str) -> Result<RowStream, BoxError>;
}

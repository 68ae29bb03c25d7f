//! Result renderers: pure row-stream to byte-stream transformations.
//!
//! Renderers perform no I/O. Each incoming `RecordBatch` becomes one
//! outgoing byte chunk, so chunk boundaries in the rendered stream
//! follow the evaluator's batch boundaries and cancellation cuts the
//! output exactly between batches.

use arrow_array::RecordBatch;
use thiserror::Error;

pub mod csv;
pub mod json;

pub use csv::{render_csv, CsvRenderConfig};
pub use json::{render_json, JsonRenderConfig};

/// Error raised while rendering rows into bytes.
#[derive(Debug, Error)]
#[error("render error: {0}")]
pub struct RenderError(pub String);

impl RenderError {
    /// Creates a render error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Clips `batch` against the remaining row budget, decrementing it.
///
/// Returns the batch unchanged while the budget allows; a budget of
/// `None` is unlimited.
pub(crate) fn clip_to_limit(batch: RecordBatch, remaining: &mut Option<u64>) -> RecordBatch {
    let Some(rest) = *remaining else {
        return batch;
    };
    let rows = batch.num_rows() as u64;
    if rows <= rest {
        *remaining = Some(rest - rows);
        batch
    } else {
        *remaining = Some(0);
        let take = usize::try_from(rest).unwrap_or(usize::MAX);
        batch.slice(0, take)
    }
}

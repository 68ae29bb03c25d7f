//! Lazy stream currency shared across spillway layers.
//!
//! Rows travel as Arrow `RecordBatch` chunks and rendered output as
//! `Bytes` chunks. Both streams are pull-based and finite. An `Err`
//! item is a terminal event; consumers stop polling after observing
//! one. Dropping a stream cancels whatever produces it, which is how
//! cooperative cancellation reaches the evaluator.

use arrow_array::RecordBatch;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Opaque, message-bearing error carried by stream items and activity
/// results.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A lazy, finite stream of row chunks produced by a query evaluator.
pub type RowStream = BoxStream<'static, Result<RecordBatch, BoxError>>;

/// A lazy, finite stream of rendered byte chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, BoxError>>;

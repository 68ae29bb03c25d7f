//! Test doubles for destinations and sinks.
//!
//! Most lifecycle tests use the in-memory destination from
//! [`crate::memory`]; the helpers here cover the failure shapes memory
//! sinks cannot produce.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrow_schema::SchemaRef;
use async_trait::async_trait;
use futures::StreamExt;

use spillway_core::streaming::ByteStream;

use crate::destination::{Destination, DestinationTypeId, ResultType, Sink};
use crate::error::ConnectorError;

/// Destination whose sink fails after accepting a fixed number of
/// chunks.
pub struct FailingDestination {
    type_id: DestinationTypeId,
    sinks: Vec<Arc<dyn Sink>>,
}

impl FailingDestination {
    /// Creates a destination whose sinks error with `message` after
    /// consuming `accept_chunks` chunks.
    #[must_use]
    pub fn new(accept_chunks: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        let sinks = [ResultType::Csv, ResultType::Json]
            .iter()
            .map(|&format| {
                Arc::new(FailingSink {
                    format,
                    accept_chunks,
                    consumed: AtomicUsize::new(0),
                    message: message.clone(),
                }) as Arc<dyn Sink>
            })
            .collect();
        Self {
            type_id: DestinationTypeId::new("failing", 1),
            sinks,
        }
    }
}

impl Destination for FailingDestination {
    fn type_id(&self) -> DestinationTypeId {
        self.type_id.clone()
    }

    fn sinks(&self) -> &[Arc<dyn Sink>] {
        &self.sinks
    }
}

struct FailingSink {
    format: ResultType,
    accept_chunks: usize,
    consumed: AtomicUsize,
    message: String,
}

#[async_trait]
impl Sink for FailingSink {
    fn result_type(&self) -> ResultType {
        self.format
    }

    async fn consume(
        &self,
        _path: &str,
        _schema: SchemaRef,
        mut bytes: ByteStream,
    ) -> Result<(), ConnectorError> {
        while let Some(chunk) = bytes.next().await {
            chunk.map_err(ConnectorError::Upstream)?;
            let seen = self.consumed.fetch_add(1, Ordering::SeqCst) + 1;
            if seen > self.accept_chunks {
                return Err(ConnectorError::Write(self.message.clone()));
            }
        }
        Ok(())
    }
}

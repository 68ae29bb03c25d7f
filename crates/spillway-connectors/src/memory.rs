//! In-memory destination.
//!
//! Byte chunks are appended under their path key as they arrive, so a
//! cancelled push leaves exactly the chunks delivered before the
//! cancellation signal, the same partial-output contract a real
//! object store gives.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::SchemaRef;
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;

use spillway_core::streaming::ByteStream;

use crate::destination::{Destination, DestinationTypeId, ResultType, Sink};
use crate::error::ConnectorError;

/// Shared contents of a [`MemoryDestination`], keyed by path.
///
/// Cheaply cloneable; every clone observes the same data.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes written under `path`, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().get(path).cloned()
    }

    /// Returns the bytes under `path` decoded as UTF-8.
    #[must_use]
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Number of paths written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    fn truncate(&self, path: &str) {
        self.inner.lock().insert(path.to_string(), Vec::new());
    }

    fn append(&self, path: &str, chunk: &[u8]) {
        self.inner
            .lock()
            .entry(path.to_string())
            .or_default()
            .extend_from_slice(chunk);
    }
}

struct MemorySink {
    format: ResultType,
    store: MemoryStore,
}

#[async_trait]
impl Sink for MemorySink {
    fn result_type(&self) -> ResultType {
        self.format
    }

    async fn consume(
        &self,
        path: &str,
        _schema: SchemaRef,
        mut bytes: ByteStream,
    ) -> Result<(), ConnectorError> {
        self.store.truncate(path);
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(ConnectorError::Upstream)?;
            self.store.append(path, &chunk);
        }
        tracing::debug!(path = %path, format = %self.format, "memory sink complete");
        Ok(())
    }
}

/// Destination keeping everything in process memory.
///
/// Supports every format by default;
/// [`with_formats`](MemoryDestination::with_formats) restricts the
/// sink set.
pub struct MemoryDestination {
    type_id: DestinationTypeId,
    store: MemoryStore,
    sinks: Vec<Arc<dyn Sink>>,
}

impl MemoryDestination {
    /// Creates a destination with a CSV and a JSON sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_formats(&[ResultType::Csv, ResultType::Json])
    }

    /// Creates a destination offering only the given formats.
    /// `formats` must be non-empty.
    #[must_use]
    pub fn with_formats(formats: &[ResultType]) -> Self {
        let store = MemoryStore::new();
        let sinks = formats
            .iter()
            .map(|&format| {
                Arc::new(MemorySink {
                    format,
                    store: store.clone(),
                }) as Arc<dyn Sink>
            })
            .collect();
        Self {
            type_id: DestinationTypeId::new("memory", 1),
            store,
            sinks,
        }
    }

    /// The shared store backing this destination.
    #[must_use]
    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }
}

impl Default for MemoryDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl Destination for MemoryDestination {
    fn type_id(&self) -> DestinationTypeId {
        self.type_id.clone()
    }

    fn sinks(&self) -> &[Arc<dyn Sink>] {
        &self.sinks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;

    use arrow_schema::Schema;
    use bytes::Bytes;
    use futures::stream;

    fn empty_schema() -> SchemaRef {
        StdArc::new(Schema::empty())
    }

    #[tokio::test]
    async fn test_consume_appends_chunks() {
        let dest = MemoryDestination::new();
        let sink = dest.sink_for(ResultType::Csv).unwrap();
        let bytes = stream::iter(vec![
            Ok(Bytes::from_static(b"a,b\n")),
            Ok(Bytes::from_static(b"1,2\n")),
        ])
        .boxed();

        sink.consume("/out.csv", empty_schema(), bytes).await.unwrap();

        assert_eq!(dest.store().get_string("/out.csv").unwrap(), "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_consume_truncates_previous_contents() {
        let dest = MemoryDestination::new();
        let sink = dest.sink_for(ResultType::Csv).unwrap();

        let first = stream::iter(vec![Ok(Bytes::from_static(b"old"))]).boxed();
        sink.consume("/p", empty_schema(), first).await.unwrap();
        let second = stream::iter(vec![Ok(Bytes::from_static(b"new"))]).boxed();
        sink.consume("/p", empty_schema(), second).await.unwrap();

        assert_eq!(dest.store().get_string("/p").unwrap(), "new");
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_prefix() {
        let dest = MemoryDestination::new();
        let sink = dest.sink_for(ResultType::Csv).unwrap();
        let bytes = stream::iter(vec![
            Ok(Bytes::from_static(b"kept")),
            Err("boom".into()),
        ])
        .boxed();

        let err = sink
            .consume("/p", empty_schema(), bytes)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert_eq!(dest.store().get_string("/p").unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_dropped_stream_keeps_prefix() {
        // Consuming task cancelled between chunks: delivered bytes stay.
        let dest = MemoryDestination::new();
        let sink = dest.sink_for(ResultType::Csv).unwrap();
        let store = dest.store();

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, _>>(1);
        let bytes = tokio_stream_from(rx);
        let handle = tokio::spawn(async move {
            sink.consume("/p", StdArc::new(Schema::empty()), bytes).await
        });

        tx.send(Ok(Bytes::from_static(b"prefix"))).await.unwrap();
        // Wait for the sink to pick the chunk up, then abort it.
        for _ in 0..100 {
            if store.get("/p").is_some_and(|b| !b.is_empty()) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        handle.abort();

        assert_eq!(store.get_string("/p").unwrap(), "prefix");
    }

    fn tokio_stream_from(
        rx: tokio::sync::mpsc::Receiver<Result<Bytes, spillway_core::streaming::BoxError>>,
    ) -> ByteStream {
        stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed()
    }

    #[test]
    fn test_with_formats_restricts_sinks() {
        let dest = MemoryDestination::with_formats(&[ResultType::Json]);
        assert!(dest.sink_for(ResultType::Json).is_some());
        assert!(dest.sink_for(ResultType::Csv).is_none());
    }
}

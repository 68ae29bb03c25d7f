//! Local filesystem destination.
//!
//! Each sink streams byte chunks into a file under the destination
//! root, creating parent directories on first write. Chunks are
//! written and flushed as they arrive, so output delivered before a
//! cancellation survives on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_schema::SchemaRef;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use spillway_core::streaming::ByteStream;

use crate::destination::{Destination, DestinationTypeId, ResultType, Sink};
use crate::error::ConnectorError;

/// Destination writing rendered results to the local filesystem.
pub struct FsDestination {
    root: PathBuf,
    type_id: DestinationTypeId,
    sinks: Vec<Arc<dyn Sink>>,
}

impl FsDestination {
    /// Creates a filesystem destination rooted at `root`, with a CSV
    /// and a JSON sink.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let sinks = [ResultType::Csv, ResultType::Json]
            .iter()
            .map(|&format| {
                Arc::new(FsSink {
                    root: root.clone(),
                    format,
                }) as Arc<dyn Sink>
            })
            .collect();
        Self {
            root,
            type_id: DestinationTypeId::new("fs", 1),
            sinks,
        }
    }

    /// The directory all destination paths resolve under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Destination for FsDestination {
    fn type_id(&self) -> DestinationTypeId {
        self.type_id.clone()
    }

    fn sinks(&self) -> &[Arc<dyn Sink>] {
        &self.sinks
    }
}

struct FsSink {
    root: PathBuf,
    format: ResultType,
}

/// Joins `path` under `root`, treating a leading slash as
/// root-relative.
fn resolve(root: &Path, path: &str) -> PathBuf {
    root.join(path.trim_start_matches('/'))
}

#[async_trait]
impl Sink for FsSink {
    fn result_type(&self) -> ResultType {
        self.format
    }

    async fn consume(
        &self,
        path: &str,
        _schema: SchemaRef,
        mut bytes: ByteStream,
    ) -> Result<(), ConnectorError> {
        let target = resolve(&self.root, path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = File::create(&target).await?;
        tracing::debug!(path = %target.display(), format = %self.format, "fs sink opened");

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(ConnectorError::Upstream)?;
            file.write_all(&chunk).await?;
            file.flush().await?;
        }

        tracing::debug!(path = %target.display(), "fs sink complete");
        Ok(())
    }
}

//! Destination and sink contracts.
//!
//! A destination is an external system that receives rendered query
//! results. Each destination owns one or more sinks; a sink consumes a
//! byte stream for one result format at one path. Destinations are
//! dynamic trait objects so new kinds can be registered without
//! touching the push layer.

use std::fmt;
use std::sync::Arc;

use arrow_schema::SchemaRef;
use async_trait::async_trait;

use spillway_core::streaming::ByteStream;

use crate::error::ConnectorError;

/// Serialization formats a sink can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    /// Comma-separated values.
    Csv,
    /// JSON documents.
    Json,
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultType::Csv => write!(f, "csv"),
            ResultType::Json => write!(f, "json"),
        }
    }
}

/// Identifies a destination implementation and its contract revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationTypeId {
    /// Implementation name, e.g. `"fs"`.
    pub name: String,
    /// Contract revision.
    pub version: u32,
}

impl DestinationTypeId {
    /// Creates a type id.
    #[must_use]
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for DestinationTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Consumer of a rendered byte stream for one format.
#[async_trait]
pub trait Sink: Send + Sync {
    /// The format this sink accepts.
    fn result_type(&self) -> ResultType;

    /// Consumes `bytes`, delivering them under `path`.
    ///
    /// Returns when the stream terminates. Chunks are delivered as they
    /// arrive; bytes delivered before an error or cancellation stay at
    /// the destination.
    async fn consume(
        &self,
        path: &str,
        schema: SchemaRef,
        bytes: ByteStream,
    ) -> Result<(), ConnectorError>;
}

/// An external system that accepts rendered results.
pub trait Destination: Send + Sync {
    /// Identifies the destination implementation.
    fn type_id(&self) -> DestinationTypeId;

    /// The sinks this destination offers, one per supported format.
    /// Never empty.
    fn sinks(&self) -> &[Arc<dyn Sink>];

    /// Returns the sink matching `format`, if the destination has one.
    fn sink_for(&self, format: ResultType) -> Option<Arc<dyn Sink>> {
        self.sinks()
            .iter()
            .find(|sink| sink.result_type() == format)
            .cloned()
    }
}

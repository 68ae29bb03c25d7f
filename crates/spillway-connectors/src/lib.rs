//! # Spillway Connectors
//!
//! The boundary layer of spillway: destination and sink contracts, the
//! CSV and JSON result renderers, and the concrete destinations that
//! rendered query results leave the process through.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod destination;
pub mod error;
pub mod format;
pub mod fs;
pub mod memory;
pub mod testing;

pub use destination::{Destination, DestinationTypeId, ResultType, Sink};
pub use error::{ConnectorError, ConnectorResult};

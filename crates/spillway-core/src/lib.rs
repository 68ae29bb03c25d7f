//! # Spillway Core
//!
//! The engine layer of spillway: a keyed background-job manager with
//! cooperative cancellation, the wall-clock abstraction used for
//! lifecycle timestamps, and the lazy row/byte stream currency shared
//! by the renderer and destination layers.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod job;
pub mod streaming;

pub use clock::{Clock, ManualClock, SystemClock};
pub use job::{JobError, JobManager, JobOutcome};

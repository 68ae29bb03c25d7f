//! Fluent builder for [`PushController`].
//!
//! # Example
//!
//! ```rust,ignore
//! let controller = PushControllerBuilder::new(tables, destinations, evaluator)
//!     .config(PushConfig::default())
//!     .clock(Arc::new(SystemClock))
//!     .build();
//! ```

use std::sync::Arc;

use spillway_core::clock::{Clock, SystemClock};

use crate::catalog::{DestinationStore, TableStore};
use crate::config::PushConfig;
use crate::controller::PushController;
use crate::evaluator::QueryEvaluator;

/// Builder for [`PushController`] with injectable clock and config.
pub struct PushControllerBuilder {
    tables: Arc<dyn TableStore>,
    destinations: Arc<dyn DestinationStore>,
    evaluator: Arc<dyn QueryEvaluator>,
    clock: Arc<dyn Clock>,
    config: PushConfig,
}

impl PushControllerBuilder {
    /// Creates a builder over the given collaborators.
    #[must_use]
    pub fn new(
        tables: Arc<dyn TableStore>,
        destinations: Arc<dyn DestinationStore>,
        evaluator: Arc<dyn QueryEvaluator>,
    ) -> Self {
        Self {
            tables,
            destinations,
            evaluator,
            clock: Arc::new(SystemClock),
            config: PushConfig::default(),
        }
    }

    /// Overrides the wall clock. Tests inject a manual clock to make
    /// lifecycle timestamps deterministic.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the render configuration.
    #[must_use]
    pub fn config(mut self, config: PushConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the controller, spawning its status recorder.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn build(self) -> PushController {
        PushController::from_parts(
            self.tables,
            self.destinations,
            self.evaluator,
            self.clock,
            self.config,
        )
    }
}

//! Push controller: the public façade of the push layer.
//!
//! Composes table and destination lookups with admission, pipeline
//! submission, cancellation, and status observation. Lookups happen
//! before the admission lock is taken so slow stores never serialize
//! admission; the `Running` record is committed before the activity is
//! submitted so every outcome, including a synchronous evaluator
//! failure, lands on an existing record.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arrow_schema::SchemaRef;

use spillway_connectors::{Destination, ResultType};
use spillway_core::clock::Clock;
use spillway_core::job::JobManager;

use crate::catalog::{DestinationStore, TableStore};
use crate::config::PushConfig;
use crate::error::{PushError, PushResult};
use crate::evaluator::QueryEvaluator;
use crate::pipeline::build_pipeline;
use crate::registry::PushRegistry;
use crate::types::{DestinationId, PushKey, PushRecord, PushSpec, TableId, TableRef};

/// Orchestrates pushes: admission, execution, cancellation, status.
///
/// Construct with [`PushController::new`] or, to inject a clock or
/// render configuration, through
/// [`PushControllerBuilder`](crate::builder::PushControllerBuilder).
/// Construction spawns the status recorder and therefore must happen
/// inside a tokio runtime.
pub struct PushController {
    tables: Arc<dyn TableStore>,
    destinations: Arc<dyn DestinationStore>,
    evaluator: Arc<dyn QueryEvaluator>,
    registry: Arc<PushRegistry>,
    jobs: JobManager<PushKey>,
    clock: Arc<dyn Clock>,
    config: PushConfig,
    #[allow(dead_code)]
    recorder: tokio::task::JoinHandle<()>,
}

impl PushController {
    /// Creates a controller with the system clock and default render
    /// configuration.
    #[must_use]
    pub fn new(
        tables: Arc<dyn TableStore>,
        destinations: Arc<dyn DestinationStore>,
        evaluator: Arc<dyn QueryEvaluator>,
    ) -> Self {
        crate::builder::PushControllerBuilder::new(tables, destinations, evaluator).build()
    }

    pub(crate) fn from_parts(
        tables: Arc<dyn TableStore>,
        destinations: Arc<dyn DestinationStore>,
        evaluator: Arc<dyn QueryEvaluator>,
        clock: Arc<dyn Clock>,
        config: PushConfig,
    ) -> Self {
        let registry = Arc::new(PushRegistry::new());
        let (jobs, events) = JobManager::new();
        let recorder =
            crate::recorder::spawn_recorder(Arc::clone(&registry), Arc::clone(&clock), events);
        Self {
            tables,
            destinations,
            evaluator,
            registry,
            jobs,
            clock,
            config,
            recorder,
        }
    }

    /// Starts a push of `table` to `path` at `destination`.
    ///
    /// On success the push runs as a background activity; observe it
    /// through [`destination_status`](Self::destination_status). No
    /// record is created when this returns an error.
    ///
    /// # Errors
    ///
    /// [`PushError::DestinationNotFound`], [`PushError::TableNotFound`],
    /// [`PushError::FormatNotSupported`], or
    /// [`PushError::PushAlreadyRunning`].
    pub async fn start(
        &self,
        table: TableId,
        columns: SchemaRef,
        destination: DestinationId,
        path: impl Into<String> + Send,
        format: ResultType,
        limit: Option<u64>,
    ) -> PushResult<()> {
        let dest = self
            .destinations
            .destination(destination)
            .await
            .ok_or(PushError::DestinationNotFound(destination))?;
        let table_ref = self
            .tables
            .table(table)
            .await
            .ok_or(PushError::TableNotFound(table))?;
        let spec = PushSpec {
            columns,
            destination_path: path.into(),
            format,
            limit,
        };
        self.admit_and_submit(table, table_ref, destination, dest.as_ref(), spec)
    }

    /// Starts one push per entry, sharing a single destination lookup.
    ///
    /// Returns only the entries that failed to start; an empty map
    /// means every push was admitted. Admitted pushes proceed
    /// independently and are not rolled back when a sibling fails.
    pub async fn start_many(
        &self,
        destination: DestinationId,
        entries: HashMap<TableId, PushSpec>,
    ) -> HashMap<TableId, PushError> {
        let mut failures = HashMap::new();
        let Some(dest) = self.destinations.destination(destination).await else {
            for table in entries.keys() {
                failures.insert(*table, PushError::DestinationNotFound(destination));
            }
            return failures;
        };

        for (table, spec) in entries {
            let result = match self.tables.table(table).await {
                None => Err(PushError::TableNotFound(table)),
                Some(table_ref) => {
                    self.admit_and_submit(table, table_ref, destination, dest.as_ref(), spec)
                }
            };
            if let Err(err) = result {
                failures.insert(table, err);
            }
        }
        failures
    }

    /// Requests cancellation of the push of `table` to `destination`.
    ///
    /// Cancellation is cooperative: the pipeline stops at its next
    /// suspension point and output already delivered to the sink stays
    /// there. Cancelling a push that is not running is a silent no-op.
    ///
    /// # Errors
    ///
    /// [`PushError::DestinationNotFound`] or
    /// [`PushError::TableNotFound`].
    pub async fn cancel(&self, table: TableId, destination: DestinationId) -> PushResult<()> {
        self.destinations
            .destination(destination)
            .await
            .ok_or(PushError::DestinationNotFound(destination))?;
        self.tables
            .table(table)
            .await
            .ok_or(PushError::TableNotFound(table))?;

        tracing::info!(table = %table, destination = %destination, "push cancel requested");
        self.jobs.cancel(&PushKey::new(table, destination));
        Ok(())
    }

    /// Requests cancellation of several pushes to one destination.
    ///
    /// The destination is resolved once. Every id is attempted even if
    /// some fail; the returned map holds only the failures. Ids
    /// without an active push contribute no entry.
    pub async fn cancel_many(
        &self,
        destination: DestinationId,
        ids: HashSet<TableId>,
    ) -> HashMap<TableId, PushError> {
        let mut failures = HashMap::new();
        if self.destinations.destination(destination).await.is_none() {
            for table in ids {
                failures.insert(table, PushError::DestinationNotFound(destination));
            }
            return failures;
        }

        for table in ids {
            if self.tables.table(table).await.is_none() {
                failures.insert(table, PushError::TableNotFound(table));
                continue;
            }
            self.jobs.cancel(&PushKey::new(table, destination));
        }
        failures
    }

    /// Requests cancellation of every push started by this controller.
    pub fn cancel_all(&self) {
        tracing::info!("cancelling all pushes");
        self.jobs.cancel_all();
    }

    /// Returns the record of every known push to `destination`, keyed
    /// by table. The map may be empty.
    ///
    /// # Errors
    ///
    /// [`PushError::DestinationNotFound`].
    pub async fn destination_status(
        &self,
        destination: DestinationId,
    ) -> PushResult<HashMap<TableId, PushRecord>> {
        self.destinations
            .destination(destination)
            .await
            .ok_or(PushError::DestinationNotFound(destination))?;
        Ok(self.registry.for_destination(destination))
    }

    /// Number of pushes currently running.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.jobs.live_count()
    }

    /// Admission and submission: the only section that mutates shared
    /// state. The record is committed before the activity is submitted
    /// so the completion handler always finds it.
    fn admit_and_submit(
        &self,
        table: TableId,
        table_ref: TableRef,
        destination: DestinationId,
        dest: &dyn Destination,
        spec: PushSpec,
    ) -> PushResult<()> {
        let Some(sink) = dest.sink_for(spec.format) else {
            return Err(PushError::FormatNotSupported(dest.type_id(), spec.format));
        };

        let key = PushKey::new(table, destination);
        self.registry.admit(key, spec.clone(), self.clock.now())?;

        tracing::info!(
            table = %table,
            destination = %destination,
            path = %spec.destination_path,
            format = %spec.format,
            "push started"
        );
        let activity = build_pipeline(
            Arc::clone(&self.evaluator),
            table_ref,
            sink,
            spec,
            self.config.clone(),
        );
        self.jobs.submit(key, activity);
        Ok(())
    }
}

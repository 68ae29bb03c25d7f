//! Push registry and admission control.
//!
//! The registry is the single piece of shared mutable state in the
//! push layer: a map from [`PushKey`] to [`PushRecord`]. Admission is
//! an atomic check-and-insert under the write lock; the critical
//! section is O(1) and performs no I/O. Terminal records stay in the
//! map until a later push for the same key replaces them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use spillway_core::job::JobOutcome;

use crate::error::PushError;
use crate::types::{DestinationId, PushKey, PushRecord, PushSpec, PushStatus, TableId};

/// In-memory map of every push currently or recently known.
#[derive(Default)]
pub struct PushRegistry {
    records: RwLock<HashMap<PushKey, PushRecord>>,
}

impl PushRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a push under `key`, creating its `Running` record.
    ///
    /// A terminal record under the same key is replaced.
    ///
    /// # Errors
    ///
    /// [`PushError::PushAlreadyRunning`] when a running record already
    /// holds the key.
    pub fn admit(
        &self,
        key: PushKey,
        spec: PushSpec,
        now: DateTime<Utc>,
    ) -> Result<(), PushError> {
        let mut records = self.records.write();
        if let Some(existing) = records.get(&key) {
            if !existing.status.is_terminal() {
                return Err(PushError::PushAlreadyRunning(key.table, key.destination));
            }
        }
        records.insert(
            key,
            PushRecord {
                spec,
                started_at: now,
                status: PushStatus::Running { since: now },
            },
        );
        Ok(())
    }

    /// Applies the terminal transition for `outcome` to the record
    /// under `key`.
    ///
    /// Returns `false` when no record holds the key, so the caller can
    /// log the discarded notification.
    pub fn complete(&self, key: PushKey, outcome: JobOutcome, now: DateTime<Utc>) -> bool {
        let mut records = self.records.write();
        let Some(record) = records.get_mut(&key) else {
            return false;
        };
        let since = record.status.since();
        record.status = match outcome {
            JobOutcome::Completed => PushStatus::Finished { since, until: now },
            JobOutcome::Canceled => PushStatus::Canceled { since, until: now },
            JobOutcome::Failed(cause) => PushStatus::Failed {
                since,
                until: now,
                cause,
            },
        };
        true
    }

    /// Snapshot of the record under `key`.
    #[must_use]
    pub fn get(&self, key: PushKey) -> Option<PushRecord> {
        self.records.read().get(&key).cloned()
    }

    /// Snapshots of all records targeting `destination`, keyed by
    /// table. May be empty.
    #[must_use]
    pub fn for_destination(&self, destination: DestinationId) -> HashMap<TableId, PushRecord> {
        self.records
            .read()
            .iter()
            .filter(|(key, _)| key.destination == destination)
            .map(|(key, record)| (key.table, record.clone()))
            .collect()
    }

    /// Number of records retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the registry holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

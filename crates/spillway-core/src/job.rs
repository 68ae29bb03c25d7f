//! Keyed background jobs with cooperative cancellation.
//!
//! [`JobManager`] owns a set of named, independently cancellable
//! activities. Each activity is a finite computation submitted under a
//! key unique within the manager; it runs in its own tokio task with
//! exclusive ownership of its work. Terminal outcomes are delivered in
//! completion order on the channel handed out at construction.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::streaming::BoxError;

/// Message-bearing cause attached to a failed job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct JobError {
    message: String,
}

impl JobError {
    /// Creates a job error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<BoxError> for JobError {
    fn from(err: BoxError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Terminal outcome of a submitted activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The activity ran to completion.
    Completed,
    /// The activity was cancelled before it completed.
    Canceled,
    /// The activity terminated with an error.
    Failed(JobError),
}

/// Manager for keyed, cancellable background activities.
///
/// At most one activity per key is live at a time; the admission layer
/// above guarantees a key is never resubmitted while live. The key is
/// registered synchronously during [`submit`](JobManager::submit), so a
/// cancel issued any time after `submit` returns reaches the activity.
pub struct JobManager<K> {
    jobs: Arc<Mutex<HashMap<K, CancellationToken>>>,
    events: mpsc::UnboundedSender<(K, JobOutcome)>,
}

impl<K> JobManager<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Creates a manager and the receiving end of its completion
    /// channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(K, JobOutcome)>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                jobs: Arc::new(Mutex::new(HashMap::new())),
                events,
            },
            rx,
        )
    }

    /// Submits `activity` under `key` and starts it immediately.
    ///
    /// The activity races its cancellation token inside `select!`;
    /// cancellation drops the activity future at its next suspension
    /// point, so nothing is emitted past the cancel signal.
    pub fn submit<F>(&self, key: K, activity: F)
    where
        F: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let token = CancellationToken::new();
        {
            let mut jobs = self.jobs.lock();
            if jobs.insert(key.clone(), token.clone()).is_some() {
                // The admission layer prevents this; the stale activity
                // keeps running but can no longer be cancelled by key.
                tracing::warn!(key = ?key, "replaced a live job entry");
            }
        }

        let jobs = Arc::clone(&self.jobs);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                () = token.cancelled() => JobOutcome::Canceled,
                result = activity => match result {
                    Ok(()) => JobOutcome::Completed,
                    Err(err) => JobOutcome::Failed(JobError::from(err)),
                },
            };

            jobs.lock().remove(&key);
            tracing::debug!(key = ?key, outcome = ?outcome, "job finished");
            // A dropped receiver means the owner is shutting down.
            let _ = events.send((key, outcome));
        });
    }

    /// Requests cancellation of the activity under `key`.
    ///
    /// A no-op when no live activity holds the key.
    pub fn cancel(&self, key: &K) {
        let token = self.jobs.lock().get(key).cloned();
        if let Some(token) = token {
            tracing::debug!(key = ?key, "cancelling job");
            token.cancel();
        }
    }

    /// Requests cancellation of every live activity.
    pub fn cancel_all(&self) {
        let tokens: Vec<CancellationToken> = self.jobs.lock().values().cloned().collect();
        tracing::debug!(count = tokens.len(), "cancelling all jobs");
        for token in tokens {
            token.cancel();
        }
    }

    /// Number of live activities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.jobs.lock().len()
    }
}

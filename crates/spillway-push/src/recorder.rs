//! Status recorder: applies job outcomes to the push registry.
//!
//! A single task consumes the job manager's completion channel and
//! stamps each terminal transition with the injected clock. The task
//! ends when the job manager (and with it the channel sender) is
//! dropped.

use std::sync::Arc;

use tokio::sync::mpsc;

use spillway_core::clock::Clock;
use spillway_core::job::JobOutcome;

use crate::registry::PushRegistry;
use crate::types::PushKey;

/// Spawns the recorder task over the job manager's completion events.
pub(crate) fn spawn_recorder(
    registry: Arc<PushRegistry>,
    clock: Arc<dyn Clock>,
    mut events: mpsc::UnboundedReceiver<(PushKey, JobOutcome)>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some((key, outcome)) = events.recv().await {
            let now = clock.now();
            tracing::debug!(key = %key, outcome = ?outcome, "recording push outcome");
            if !registry.complete(key, outcome, now) {
                // Should be impossible: records are committed before
                // their activity is submitted.
                tracing::warn!(key = %key, "discarding completion for unknown push");
            }
        }
        tracing::debug!("status recorder stopped");
    })
}

//! Test collaborators for the push lifecycle.
//!
//! [`ScriptedEvaluator`] maps queries to scripted row streams so tests
//! control batch boundaries, suspensions, and failures
//! deterministically. Scripted batches use a single `value` string
//! column; that keeps rendered CSV output a direct transcript of the
//! script.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arrow_array::{RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use spillway_core::streaming::{BoxError, RowStream};

use crate::evaluator::QueryEvaluator;

/// One step of a scripted evaluation.
#[derive(Debug, Clone)]
pub enum Step {
    /// Yield one batch of string rows.
    Rows(Vec<String>),
    /// Suspend for the duration before the next step.
    Sleep(Duration),
    /// Fail the stream with the message.
    Fail(String),
}

impl Step {
    /// Convenience constructor for a single-row batch.
    #[must_use]
    pub fn row(value: &str) -> Self {
        Step::Rows(vec![value.to_string()])
    }
}

#[derive(Clone)]
enum Script {
    Steps(Vec<Step>),
    EvaluateError(String),
}

/// Evaluator that replays a configured script per query.
#[derive(Default)]
pub struct ScriptedEvaluator {
    scripts: Mutex<HashMap<String, Script>>,
}

impl ScriptedEvaluator {
    /// Creates an evaluator with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `query` to yield `steps` in order.
    pub fn script(&self, query: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .insert(query.to_string(), Script::Steps(steps));
    }

    /// Scripts `query` to fail synchronously on `evaluate`.
    pub fn fail_on_evaluate(&self, query: &str, message: &str) {
        self.scripts
            .lock()
            .insert(query.to_string(), Script::EvaluateError(message.to_string()));
    }
}

#[async_trait]
impl QueryEvaluator for ScriptedEvaluator {
    async fn evaluate(&self, query: &str) -> Result<RowStream, BoxError> {
        let script = self.scripts.lock().get(query).cloned();
        match script {
            None => Err(format!("no script for query '{query}'").into()),
            Some(Script::EvaluateError(message)) => Err(message.into()),
            Some(Script::Steps(steps)) => Ok(scripted_stream(steps)),
        }
    }
}

fn scripted_stream(steps: Vec<Step>) -> RowStream {
    stream::unfold(steps.into_iter(), |mut steps| async move {
        loop {
            match steps.next()? {
                Step::Rows(values) => {
                    let refs: Vec<&str> = values.iter().map(String::as_str).collect();
                    return Some((Ok(string_batch(&refs)), steps));
                }
                Step::Sleep(duration) => tokio::time::sleep(duration).await,
                Step::Fail(message) => {
                    return Some((Err(message.into()), steps));
                }
            }
        }
    })
    .boxed()
}

/// Schema of scripted batches: a single non-null `value` string
/// column.
#[must_use]
pub fn value_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![Field::new(
        "value",
        DataType::Utf8,
        false,
    )]))
}

/// Builds a single-column string batch over [`value_schema`].
///
/// # Panics
///
/// Panics when the batch cannot be assembled, which only happens on a
/// programming error in the test itself.
#[must_use]
pub fn string_batch(values: &[&str]) -> RecordBatch {
    RecordBatch::try_new(
        value_schema(),
        vec![Arc::new(StringArray::from(values.to_vec()))],
    )
    .expect("valid single-column batch")
}

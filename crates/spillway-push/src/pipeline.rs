//! Pipeline assembly: evaluator to renderer to sink.
//!
//! The returned future performs every fallible step, including the
//! evaluator call itself, so a synchronous evaluation failure travels
//! the completion channel like any mid-stream error; the record
//! committed at admission is already there to receive it.

use std::sync::Arc;

use futures::future::BoxFuture;

use spillway_connectors::format::{render_csv, render_json};
use spillway_connectors::{ResultType, Sink};
use spillway_core::streaming::BoxError;

use crate::config::PushConfig;
use crate::evaluator::QueryEvaluator;
use crate::types::{PushSpec, TableRef};

/// Builds the runnable activity for one admitted push.
pub(crate) fn build_pipeline(
    evaluator: Arc<dyn QueryEvaluator>,
    table: TableRef,
    sink: Arc<dyn Sink>,
    spec: PushSpec,
    config: PushConfig,
) -> BoxFuture<'static, Result<(), BoxError>> {
    Box::pin(async move {
        let rows = evaluator.evaluate(&table.query).await?;
        let bytes = match spec.format {
            ResultType::Csv => render_csv(rows, table.schema.clone(), &config.csv, spec.limit),
            ResultType::Json => render_json(rows, &config.json, spec.limit),
        };
        sink.consume(&spec.destination_path, table.schema, bytes)
            .await?;
        Ok(())
    })
}

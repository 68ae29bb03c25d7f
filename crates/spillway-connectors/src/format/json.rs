//! JSON result renderer.
//!
//! Converts a row stream into JSON byte chunks, one JSON object per
//! row, framed by a configurable prefix, row delimiter, and suffix.
//! The default framing renders the whole result as a single JSON
//! array; newline-delimited JSON is a framing choice away. A stream
//! error truncates the output without the suffix, the same shape a
//! cancellation leaves behind.

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int32Type, Int64Type, TimestampNanosecondType,
};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_schema::{DataType, TimeUnit};
use bytes::Bytes;
use futures::stream::{self, StreamExt};

use spillway_core::streaming::{BoxError, ByteStream, RowStream};

use super::{clip_to_limit, RenderError};

/// JSON renderer configuration: the framing around rendered rows.
#[derive(Debug, Clone)]
pub struct JsonRenderConfig {
    /// Emitted once before the first row. Default `"["`.
    pub prefix: String,
    /// Emitted between consecutive rows. Default `","`.
    pub delimiter: String,
    /// Emitted once after the last row. Default `"]"`.
    pub suffix: String,
}

impl Default for JsonRenderConfig {
    fn default() -> Self {
        Self {
            prefix: "[".to_string(),
            delimiter: ",".to_string(),
            suffix: "]".to_string(),
        }
    }
}

impl JsonRenderConfig {
    /// Newline-delimited JSON framing: one object per line.
    #[must_use]
    pub fn ndjson() -> Self {
        Self {
            prefix: String::new(),
            delimiter: "\n".to_string(),
            suffix: "\n".to_string(),
        }
    }
}

struct RenderState {
    rows: RowStream,
    config: JsonRenderConfig,
    remaining: Option<u64>,
    emitted_rows: bool,
    done: bool,
}

/// Renders `rows` as framed JSON, one byte chunk per incoming batch
/// plus a final chunk carrying the suffix.
///
/// `limit` caps the number of rows; once it is reached the row stream
/// is dropped without being drained.
#[must_use]
pub fn render_json(rows: RowStream, config: &JsonRenderConfig, limit: Option<u64>) -> ByteStream {
    let state = RenderState {
        rows,
        config: config.clone(),
        remaining: limit,
        emitted_rows: false,
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }
        loop {
            if st.remaining == Some(0) {
                st.done = true;
                let chunk = closing_chunk(&st.config, st.emitted_rows);
                return Some((Ok(chunk), st));
            }
            match st.rows.next().await {
                Some(Ok(batch)) => {
                    let batch = clip_to_limit(batch, &mut st.remaining);
                    if batch.num_rows() == 0 {
                        continue;
                    }
                    match encode_batch(&batch, &st.config, st.emitted_rows) {
                        Ok(buf) => {
                            st.emitted_rows = true;
                            return Some((Ok(Bytes::from(buf)), st));
                        }
                        Err(err) => {
                            st.done = true;
                            return Some((Err(err), st));
                        }
                    }
                }
                Some(Err(err)) => {
                    st.done = true;
                    return Some((Err(err), st));
                }
                None => {
                    st.done = true;
                    let chunk = closing_chunk(&st.config, st.emitted_rows);
                    return Some((Ok(chunk), st));
                }
            }
        }
    })
    .boxed()
}

fn closing_chunk(config: &JsonRenderConfig, emitted_rows: bool) -> Bytes {
    if emitted_rows {
        Bytes::from(config.suffix.clone())
    } else {
        Bytes::from(format!("{}{}", config.prefix, config.suffix))
    }
}

/// Encodes one batch into framed JSON bytes, one object per row.
fn encode_batch(
    batch: &RecordBatch,
    config: &JsonRenderConfig,
    emitted_before: bool,
) -> Result<Vec<u8>, BoxError> {
    let schema = batch.schema();
    let mut out = Vec::new();
    let mut first = !emitted_before;

    for row in 0..batch.num_rows() {
        if first {
            out.extend_from_slice(config.prefix.as_bytes());
            first = false;
        } else {
            out.extend_from_slice(config.delimiter.as_bytes());
        }

        let mut obj = serde_json::Map::with_capacity(batch.num_columns());
        for (idx, field) in schema.fields().iter().enumerate() {
            let col = batch.column(idx);
            let value = if col.is_null(row) {
                serde_json::Value::Null
            } else {
                column_value_to_json(col, row, field.data_type())?
            };
            obj.insert(field.name().clone(), value);
        }

        let bytes = serde_json::to_vec(&serde_json::Value::Object(obj))
            .map_err(|e| RenderError::new(format!("json encode error: {e}")))?;
        out.extend_from_slice(&bytes);
    }

    Ok(out)
}

fn column_value_to_json(
    col: &ArrayRef,
    row: usize,
    data_type: &DataType,
) -> Result<serde_json::Value, BoxError> {
    Ok(match data_type {
        DataType::Boolean => serde_json::Value::Bool(col.as_boolean().value(row)),
        DataType::Int32 => serde_json::Value::from(col.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => serde_json::Value::from(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            let f = f64::from(col.as_primitive::<Float32Type>().value(row));
            serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        DataType::Float64 => {
            let f = col.as_primitive::<Float64Type>().value(row);
            serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        DataType::Utf8 => serde_json::Value::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            serde_json::Value::String(col.as_string::<i64>().value(row).to_string())
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let nanos = col.as_primitive::<TimestampNanosecondType>().value(row);
            let secs = nanos.div_euclid(1_000_000_000);
            // rem_euclid is non-negative and under 1e9, so it fits u32.
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let nsec = nanos.rem_euclid(1_000_000_000) as u32;
            match chrono::DateTime::from_timestamp(secs, nsec) {
                Some(dt) => serde_json::Value::String(dt.to_rfc3339()),
                None => serde_json::Value::from(nanos),
            }
        }
        // Fallback: Arrow's own display representation.
        _ => {
            let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
                .map_err(|e| RenderError::new(e.to_string()))?;
            serde_json::Value::String(formatter.value(row).to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow_array::{BooleanArray, Float64Array, Int64Array, StringArray};
    use arrow_schema::{Field, Schema, SchemaRef};

    fn make_schema(fields: Vec<(&str, DataType, bool)>) -> SchemaRef {
        Arc::new(Schema::new(
            fields
                .into_iter()
                .map(|(name, dt, nullable)| Field::new(name, dt, nullable))
                .collect::<Vec<_>>(),
        ))
    }

    fn people_batch(ids: Vec<i64>, names: Vec<&str>) -> RecordBatch {
        let schema = make_schema(vec![
            ("id", DataType::Int64, false),
            ("name", DataType::Utf8, false),
        ]);
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(names)),
            ],
        )
        .unwrap()
    }

    fn rows_from(batches: Vec<Result<RecordBatch, BoxError>>) -> RowStream {
        stream::iter(batches).boxed()
    }

    async fn collect(mut bytes: ByteStream) -> Result<String, BoxError> {
        let mut out = Vec::new();
        while let Some(chunk) = bytes.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(String::from_utf8(out).expect("utf8 output"))
    }

    #[tokio::test]
    async fn test_render_array_framing() {
        let rows = rows_from(vec![Ok(people_batch(vec![1, 2], vec!["Alice", "Bob"]))]);
        let out = collect(render_json(rows, &JsonRenderConfig::default(), None))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["id"], 1);
        assert_eq!(parsed[0]["name"], "Alice");
        assert_eq!(parsed[1]["id"], 2);
        assert_eq!(parsed[1]["name"], "Bob");
    }

    #[tokio::test]
    async fn test_render_delimits_across_batches() {
        let rows = rows_from(vec![
            Ok(people_batch(vec![1], vec!["a"])),
            Ok(people_batch(vec![2], vec!["b"])),
        ]);
        let out = collect(render_json(rows, &JsonRenderConfig::default(), None))
            .await
            .unwrap();

        // The whole output must stay one valid JSON array.
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_render_nulls() {
        let schema = make_schema(vec![("value", DataType::Int64, true)]);
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from(vec![Some(1), None]))],
        )
        .unwrap();
        let out = collect(render_json(
            rows_from(vec![Ok(batch)]),
            &JsonRenderConfig::default(),
            None,
        ))
        .await
        .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["value"], 1);
        assert!(parsed[1]["value"].is_null());
    }

    #[tokio::test]
    async fn test_render_all_types() {
        let schema = make_schema(vec![
            ("bool_col", DataType::Boolean, false),
            ("int_col", DataType::Int64, false),
            ("float_col", DataType::Float64, false),
            ("str_col", DataType::Utf8, false),
        ]);
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(BooleanArray::from(vec![true])),
                Arc::new(Int64Array::from(vec![42])),
                Arc::new(Float64Array::from(vec![3.5])),
                Arc::new(StringArray::from(vec!["hello"])),
            ],
        )
        .unwrap();
        let out = collect(render_json(
            rows_from(vec![Ok(batch)]),
            &JsonRenderConfig::default(),
            None,
        ))
        .await
        .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["bool_col"], true);
        assert_eq!(parsed[0]["int_col"], 42);
        assert_eq!(parsed[0]["float_col"], 3.5);
        assert_eq!(parsed[0]["str_col"], "hello");
    }

    #[tokio::test]
    async fn test_render_empty_stream() {
        let out = collect(render_json(
            rows_from(vec![]),
            &JsonRenderConfig::default(),
            None,
        ))
        .await
        .unwrap();

        assert_eq!(out, "[]");
    }

    #[tokio::test]
    async fn test_render_ndjson_framing() {
        let rows = rows_from(vec![Ok(people_batch(vec![1, 2], vec!["a", "b"]))]);
        let out = collect(render_json(rows, &JsonRenderConfig::ndjson(), None))
            .await
            .unwrap();

        let lines: Vec<&str> = out.trim_end().lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(parsed["id"].is_i64());
        }
    }

    #[tokio::test]
    async fn test_render_limit() {
        let rows = rows_from(vec![Ok(people_batch(vec![1, 2, 3], vec!["a", "b", "c"]))]);
        let out = collect(render_json(rows, &JsonRenderConfig::default(), Some(2)))
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_render_error_truncates_without_suffix() {
        let rows = rows_from(vec![
            Ok(people_batch(vec![1], vec!["a"])),
            Err("boom".into()),
        ]);
        let mut bytes = render_json(rows, &JsonRenderConfig::default(), None);

        let first = bytes.next().await.unwrap().unwrap();
        assert_eq!(&first[..], br#"[{"id":1,"name":"a"}"#);
        let err = bytes.next().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(bytes.next().await.is_none());
    }
}

//! CSV result renderer.
//!
//! Converts a row stream into CSV byte chunks. Uses the `csv` crate's
//! writer for field encoding so embedded delimiters, quotes, and
//! newlines follow RFC 4180. The optional header row is part of the
//! first emitted chunk; an empty result still carries it.

use arrow_array::cast::AsArray;
use arrow_array::types::{Float32Type, Float64Type, Int32Type, Int64Type};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use arrow_schema::{DataType, SchemaRef};
use bytes::Bytes;
use futures::stream::{self, StreamExt};

use spillway_core::streaming::{BoxError, ByteStream, RowStream};

use super::{clip_to_limit, RenderError};

/// CSV renderer configuration.
///
/// Defaults follow RFC 4180: comma delimiter, double-quote quoting,
/// a header row, and the empty string for SQL NULL.
#[derive(Debug, Clone)]
pub struct CsvRenderConfig {
    /// Field delimiter character. Default `','`.
    pub delimiter: u8,
    /// Quote character for fields containing delimiters or newlines.
    /// Default `'"'`.
    pub quote: u8,
    /// Whether the output starts with a header row of column names.
    /// Default `true`.
    pub header: bool,
    /// Field value emitted for SQL NULL. Default empty.
    pub null_value: String,
}

impl Default for CsvRenderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            header: true,
            null_value: String::new(),
        }
    }
}

struct RenderState {
    rows: RowStream,
    schema: SchemaRef,
    config: CsvRenderConfig,
    remaining: Option<u64>,
    header_pending: bool,
    done: bool,
}

/// Renders `rows` as CSV, one byte chunk per incoming batch.
///
/// `schema` supplies the header column names; row values come from the
/// batches themselves. `limit` caps the number of data rows; once it is
/// reached the row stream is dropped without being drained.
#[must_use]
pub fn render_csv(
    rows: RowStream,
    schema: SchemaRef,
    config: &CsvRenderConfig,
    limit: Option<u64>,
) -> ByteStream {
    let state = RenderState {
        rows,
        schema,
        header_pending: config.header,
        config: config.clone(),
        remaining: limit,
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }
        loop {
            if st.remaining == Some(0) {
                st.done = true;
                if st.header_pending {
                    st.header_pending = false;
                    let chunk = header_only(&st.schema, &st.config);
                    return Some((chunk.map(Bytes::from), st));
                }
                return None;
            }
            match st.rows.next().await {
                Some(Ok(batch)) => {
                    let batch = clip_to_limit(batch, &mut st.remaining);
                    if batch.num_rows() == 0 && !st.header_pending {
                        continue;
                    }
                    let header = if st.header_pending {
                        Some(&st.schema)
                    } else {
                        None
                    };
                    match encode_batch(&batch, header, &st.config) {
                        Ok(buf) => {
                            st.header_pending = false;
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
                    if st.header_pending {
                        st.header_pending = false;
                        let chunk = header_only(&st.schema, &st.config);
                        return Some((chunk.map(Bytes::from), st));
                    }
                    return None;
                }
            }
        }
    })
    .boxed()
}

fn header_only(schema: &SchemaRef, config: &CsvRenderConfig) -> Result<Vec<u8>, BoxError> {
    encode_batch(&RecordBatch::new_empty(schema.clone()), Some(schema), config)
}

/// Encodes one batch (and optionally the header row) into CSV bytes.
fn encode_batch(
    batch: &RecordBatch,
    header: Option<&SchemaRef>,
    config: &CsvRenderConfig,
) -> Result<Vec<u8>, BoxError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .quote(config.quote)
        .from_writer(Vec::new());

    if let Some(schema) = header {
        writer.write_record(schema.fields().iter().map(|field| field.name().as_str()))?;
    }

    let schema = batch.schema();
    for row in 0..batch.num_rows() {
        let mut record: Vec<String> = Vec::with_capacity(batch.num_columns());
        for (idx, field) in schema.fields().iter().enumerate() {
            let col = batch.column(idx);
            let value = if col.is_null(row) {
                config.null_value.clone()
            } else {
                column_value_to_field(col, row, field.data_type())?
            };
            record.push(value);
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| RenderError::new(e.to_string()).into())
}

fn column_value_to_field(
    col: &ArrayRef,
    row: usize,
    data_type: &DataType,
) -> Result<String, BoxError> {
    Ok(match data_type {
        DataType::Boolean => col.as_boolean().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        // Fallback: Arrow's own display representation.
        _ => {
            let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
                .map_err(|e| RenderError::new(e.to_string()))?;
            formatter.value(row).to_string()
        }
    })
}

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

use crate::dataset::{BuilderOptions, ColumnBuilder, CompressionType, Value};
use crate::encoding::{ColumnType, Encoder, StreamsEncoder};

use super::error::{ColumnError, ColumnErrors, StreamsError};
use super::registry::Streams;
use super::stream::Stream;

/// Statistics from a committed streams section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionStats {
    /// Streams (rows) in the section
    pub streams: usize,
    /// Columns written, fixed and label
    pub columns: usize,
    /// Label columns written
    pub label_columns: usize,
    /// Pages written across all columns
    pub pages: usize,
    /// Stored page bytes across all columns
    pub compressed_bytes: usize,
}

impl fmt::Display for SectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} streams in {} columns ({} label columns, {} pages, {} bytes)",
            self.streams, self.columns, self.label_columns, self.pages, self.compressed_bytes
        )
    }
}

impl Streams {
    /// Encode the recorded streams as one streams section of `enc`.
    ///
    /// Streams become rows in the order they were first recorded. Each
    /// distinct label name becomes its own column, in first-seen order.
    /// `page_size_hint` is the target size of each page.
    ///
    /// Nothing is added to `enc` unless the whole section commits.
    pub fn encode_to(
        &self,
        enc: &mut Encoder,
        page_size_hint: usize,
    ) -> Result<SectionStats, StreamsError> {
        // TODO: split the streams across several sections once a single one
        // grows too wide for the encoder's column or size limits.
        let mut plan = ColumnPlan::new(page_size_hint, self.config.label_compression)?;
        for (row, stream) in self.ordered.iter().enumerate() {
            plan.append(row, stream)?;
        }

        debug!(
            "encoding {} streams with {} label columns",
            self.ordered.len(),
            plan.labels.len()
        );
        let stats = plan.write_to(enc, self.ordered.len())?;
        debug!("{stats}");
        Ok(stats)
    }
}

/// Column builders for one streams section
struct ColumnPlan {
    id: ColumnBuilder,
    min_timestamp: ColumnBuilder,
    max_timestamp: ColumnBuilder,
    rows: ColumnBuilder,

    /// Label columns in first-seen order
    labels: Vec<ColumnBuilder>,
    /// Label name to index in `labels`
    label_lookup: HashMap<String, usize>,

    page_size_hint: usize,
    label_compression: CompressionType,
}

impl ColumnPlan {
    fn new(page_size_hint: usize, label_compression: CompressionType) -> Result<Self, StreamsError> {
        let number_column = |column_type: ColumnType| {
            ColumnBuilder::new("", BuilderOptions::int64(page_size_hint)).map_err(|source| {
                StreamsError::CreateColumn {
                    column: column_type.to_string(),
                    source,
                }
            })
        };

        Ok(Self {
            id: number_column(ColumnType::StreamId)?,
            min_timestamp: number_column(ColumnType::MinTimestamp)?,
            max_timestamp: number_column(ColumnType::MaxTimestamp)?,
            rows: number_column(ColumnType::Rows)?,
            labels: Vec::new(),
            label_lookup: HashMap::new(),
            page_size_hint,
            label_compression,
        })
    }

    fn append(&mut self, row: usize, stream: &Stream) -> Result<(), StreamsError> {
        let nanos = |ts: Option<chrono::DateTime<chrono::Utc>>| {
            ts.and_then(|t| t.timestamp_nanos_opt())
                .ok_or(StreamsError::TimestampOutOfRange {
                    stream_id: stream.id,
                })
        };
        let min_timestamp = nanos(stream.min_timestamp)?;
        let max_timestamp = nanos(stream.max_timestamp)?;

        append_value(&mut self.id, ColumnType::StreamId, row, Value::Int64(stream.id))?;
        append_value(
            &mut self.min_timestamp,
            ColumnType::MinTimestamp,
            row,
            Value::Int64(min_timestamp),
        )?;
        append_value(
            &mut self.max_timestamp,
            ColumnType::MaxTimestamp,
            row,
            Value::Int64(max_timestamp),
        )?;
        append_value(
            &mut self.rows,
            ColumnType::Rows,
            row,
            Value::Int64(stream.rows as i64),
        )?;

        for label in &stream.labels {
            let builder = self.label_column(&label.name)?;
            // Labels are sorted, so a repeated name follows its first value.
            // The first value wins.
            if builder.rows() > row {
                warn!(
                    "stream {} repeats label {:?}; keeping the first value",
                    stream.id, label.name
                );
                continue;
            }
            builder
                .append(row, Value::from(label.value.as_str()))
                .map_err(|source| StreamsError::Append {
                    column: format!("label {:?}", label.name),
                    row,
                    source,
                })?;
        }
        Ok(())
    }

    fn label_column(&mut self, name: &str) -> Result<&mut ColumnBuilder, StreamsError> {
        if let Some(&idx) = self.label_lookup.get(name) {
            return Ok(&mut self.labels[idx]);
        }

        let options = BuilderOptions::string(self.page_size_hint, self.label_compression);
        let builder = ColumnBuilder::new(name, options).map_err(|source| {
            StreamsError::CreateColumn {
                column: format!("label {name:?}"),
                source,
            }
        })?;

        self.labels.push(builder);
        let idx = self.labels.len() - 1;
        self.label_lookup.insert(name.to_string(), idx);
        Ok(&mut self.labels[idx])
    }

    /// Write every column to a new section of `enc` and commit it
    fn write_to(mut self, enc: &mut Encoder, total_rows: usize) -> Result<SectionStats, StreamsError> {
        let mut section = enc.open_streams().map_err(StreamsError::OpenSection)?;
        let mut stats = SectionStats {
            streams: total_rows,
            ..SectionStats::default()
        };

        // Every fixed column is attempted so that all failures are reported
        // together.
        let results = [
            encode_column(&mut section, ColumnType::StreamId, &mut self.id, &mut stats),
            encode_column(
                &mut section,
                ColumnType::MinTimestamp,
                &mut self.min_timestamp,
                &mut stats,
            ),
            encode_column(
                &mut section,
                ColumnType::MaxTimestamp,
                &mut self.max_timestamp,
                &mut stats,
            ),
            encode_column(&mut section, ColumnType::Rows, &mut self.rows, &mut stats),
        ];
        let errors: Vec<ColumnError> = results.into_iter().filter_map(Result::err).collect();
        if !errors.is_empty() {
            return Err(StreamsError::EncodeColumns(ColumnErrors(errors)));
        }

        for builder in &mut self.labels {
            let name = builder.name().to_string();
            let label_error = |source| StreamsError::EncodeLabelColumn {
                name: name.clone(),
                source,
            };

            // Label columns are sparse; pad them so every column in the
            // section has one row per stream.
            builder
                .backfill(total_rows)
                .map_err(|source| label_error(ColumnError::Backfill {
                    column_type: ColumnType::Label,
                    rows: total_rows,
                    source,
                }))?;
            encode_column(&mut section, ColumnType::Label, builder, &mut stats)
                .map_err(label_error)?;
            stats.label_columns += 1;
        }

        section.commit().map_err(StreamsError::CommitSection)?;
        Ok(stats)
    }
}

fn append_value(
    builder: &mut ColumnBuilder,
    column_type: ColumnType,
    row: usize,
    value: Value,
) -> Result<(), StreamsError> {
    builder
        .append(row, value)
        .map_err(|source| StreamsError::Append {
            column: column_type.to_string(),
            row,
            source,
        })
}

/// Flush `builder` and write its pages through a column transaction
fn encode_column(
    section: &mut StreamsEncoder<'_>,
    column_type: ColumnType,
    builder: &mut ColumnBuilder,
    stats: &mut SectionStats,
) -> Result<(), ColumnError> {
    let column = builder
        .flush()
        .map_err(|source| ColumnError::Flush { column_type, source })?;

    let mut column_enc = section
        .open_column(column_type, &column.info)
        .map_err(|source| ColumnError::Open { column_type, source })?;

    let page_count = column.pages.len();
    for (page, data) in column.pages.into_iter().enumerate() {
        column_enc
            .append_page(data)
            .map_err(|source| ColumnError::AppendPage {
                column_type,
                page,
                source,
            })?;
    }
    column_enc
        .commit()
        .map_err(|source| ColumnError::Commit { column_type, source })?;

    stats.columns += 1;
    stats.pages += page_count;
    stats.compressed_bytes += column.info.compressed_size;
    Ok(())
}

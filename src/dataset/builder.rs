use arrow::array::{Int64Builder, StringBuilder};
use log::trace;

use super::column::{Column, ColumnInfo, Statistics};
use super::config::BuilderOptions;
use super::error::DatasetError;
use super::page::{encoded_len, Page, PageValues};
use super::value::{Value, ValueType};

/// Arrow builder for the page currently being filled
enum PageBuffer {
    Int64(Int64Builder),
    String(StringBuilder),
}

impl PageBuffer {
    fn new(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Int64 => PageBuffer::Int64(Int64Builder::new()),
            ValueType::String => PageBuffer::String(StringBuilder::new()),
        }
    }

    fn append(&mut self, value: &Value) {
        match (self, value) {
            (PageBuffer::Int64(b), Value::Int64(v)) => b.append_value(*v),
            (PageBuffer::String(b), Value::String(v)) => b.append_value(v),
            (PageBuffer::Int64(b), _) => b.append_null(),
            (PageBuffer::String(b), _) => b.append_null(),
        }
    }
}

/// Incrementally builds one column of values, cutting it into pages.
///
/// Rows must be appended in strictly increasing order. Skipped rows are
/// stored as nulls.
pub struct ColumnBuilder {
    name: String,
    options: BuilderOptions,
    buffer: PageBuffer,
    /// Rows in `buffer`
    page_rows: usize,
    /// Estimated value bytes in `buffer`
    page_bytes: usize,
    pages: Vec<Page>,
    rows: usize,
    statistics: Statistics,
}

impl ColumnBuilder {
    /// Create a new builder. Fails if the options are not a supported
    /// combination.
    pub fn new(name: impl Into<String>, options: BuilderOptions) -> Result<Self, DatasetError> {
        let name = name.into();
        options.validate(&name)?;

        Ok(Self {
            name,
            buffer: PageBuffer::new(options.value),
            options,
            page_rows: 0,
            page_bytes: 0,
            pages: Vec::new(),
            rows: 0,
            statistics: Statistics::default(),
        })
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows appended so far, including nulls
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append `value` at `row`.
    ///
    /// `row` must be greater than every previously appended row; any gap is
    /// filled with nulls.
    pub fn append(&mut self, row: usize, value: Value) -> Result<(), DatasetError> {
        if let Some(actual) = value.value_type() {
            if actual != self.options.value {
                return Err(DatasetError::ValueTypeMismatch {
                    expected: self.options.value,
                    actual,
                });
            }
        }
        if row < self.rows {
            return Err(DatasetError::OutOfOrderRow {
                row,
                rows: self.rows,
            });
        }

        self.backfill(row)?;
        self.push(&value)
    }

    /// Append nulls until the column holds `rows` rows. Does nothing if it
    /// already holds that many.
    pub fn backfill(&mut self, rows: usize) -> Result<(), DatasetError> {
        while self.rows < rows {
            self.push(&Value::Null)?;
        }
        Ok(())
    }

    /// Finish the column, returning its metadata and pages. The builder is
    /// reset and can be reused, even when the last page fails to encode.
    pub fn flush(&mut self) -> Result<Column, DatasetError> {
        let cut = if self.page_rows > 0 {
            self.cut_page()
        } else {
            Ok(())
        };

        let pages = std::mem::take(&mut self.pages);
        let statistics = std::mem::take(&mut self.statistics);
        self.rows = 0;
        cut?;

        let mut info = ColumnInfo {
            name: self.name.clone(),
            value_type: self.options.value,
            encoding: self.options.encoding,
            compression: self.options.compression,
            rows_count: 0,
            values_count: 0,
            uncompressed_size: 0,
            compressed_size: 0,
            statistics,
        };
        for page in &pages {
            info.rows_count += page.info.rows_count;
            info.values_count += page.info.values_count;
            info.uncompressed_size += page.info.uncompressed_size;
            info.compressed_size += page.info.compressed_size;
        }

        Ok(Column { info, pages })
    }

    fn push(&mut self, value: &Value) -> Result<(), DatasetError> {
        let size = encoded_len(value);
        if self.page_rows > 0 && self.page_estimate() + size > self.options.page_size_hint {
            self.cut_page()?;
        }

        self.buffer.append(value);
        self.statistics.observe(value);
        self.page_rows += 1;
        self.page_bytes += size;
        self.rows += 1;
        Ok(())
    }

    fn page_estimate(&self) -> usize {
        self.page_bytes + self.page_rows / 8 + 1
    }

    /// Encode the buffered rows as a page. The buffer is emptied either way.
    fn cut_page(&mut self) -> Result<(), DatasetError> {
        let encoded = match &mut self.buffer {
            PageBuffer::Int64(b) => {
                let array = b.finish();
                Page::encode(
                    PageValues::Int64(&array),
                    self.options.encoding,
                    self.options.compression,
                )
            }
            PageBuffer::String(b) => {
                let array = b.finish();
                Page::encode(
                    PageValues::String(&array),
                    self.options.encoding,
                    self.options.compression,
                )
            }
        };
        self.page_rows = 0;
        self.page_bytes = 0;
        let page = encoded?;

        trace!(
            "column {:?}: cut page of {} rows ({} bytes)",
            self.name,
            page.info.rows_count,
            page.info.compressed_size
        );
        self.pages.push(page);
        Ok(())
    }
}

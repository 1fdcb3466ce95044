use std::io::Write;

use bytes::{BufMut, BytesMut};
use log::{debug, warn};

use crate::dataset::{ColumnInfo, Page};

use super::config::EncoderConfig;
use super::error::EncodingError;
use super::metadata::{
    ColumnMetadata, ColumnType, FileMetadata, PageDescriptor, SectionKind, SectionMetadata,
    FORMAT_VERSION, MAGIC,
};

/// Builds a data object out of committed sections.
///
/// Sections are written through [`StreamsEncoder`] transactions; nothing
/// becomes part of the object until the transaction commits.
#[derive(Debug, Default)]
pub struct Encoder {
    config: EncoderConfig,
    /// Committed page bytes, placed directly after the leading magic
    data: BytesMut,
    sections: Vec<SectionMetadata>,
}

impl Encoder {
    /// Create an encoder without limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with the given limits
    pub fn with_config(config: EncoderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Committed sections
    pub fn sections(&self) -> &[SectionMetadata] {
        &self.sections
    }

    /// Footer metadata for the sections committed so far
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            format_version: FORMAT_VERSION,
            sections: self.sections.clone(),
        }
    }

    /// Open a transaction for a new streams section.
    ///
    /// The returned guard discards the section when dropped unless
    /// [`StreamsEncoder::commit`] succeeds.
    pub fn open_streams(&mut self) -> Result<StreamsEncoder<'_>, EncodingError> {
        if let Some(limit) = self.config.max_sections {
            if self.sections.len() >= limit {
                return Err(EncodingError::TooManySections { limit });
            }
        }

        debug!("opened streams section {}", self.sections.len());
        Ok(StreamsEncoder {
            buffer: SectionBuffer {
                config: self.config,
                committed_bytes: 0,
                data: BytesMut::new(),
                columns: Vec::new(),
            },
            parent: self,
            closed: false,
        })
    }

    /// Write the data object to `writer` and reset the encoder. Returns the
    /// number of bytes written.
    pub fn flush<W: Write>(&mut self, mut writer: W) -> Result<u64, EncodingError> {
        let metadata = serde_json::to_vec(&self.metadata())?;
        let metadata_len = u32::try_from(metadata.len()).map_err(|_| {
            EncodingError::InvalidFile(format!("metadata of {} bytes", metadata.len()))
        })?;

        writer.write_all(MAGIC)?;
        writer.write_all(&self.data)?;
        writer.write_all(&metadata)?;
        writer.write_all(&metadata_len.to_le_bytes())?;
        writer.write_all(MAGIC)?;
        writer.flush()?;

        let written = (MAGIC.len() * 2 + self.data.len() + metadata.len() + 4) as u64;
        debug!(
            "flushed data object: {} sections, {} bytes",
            self.sections.len(),
            written
        );
        self.reset();
        Ok(written)
    }

    /// Drop every committed section
    pub fn reset(&mut self) {
        self.data.clear();
        self.sections.clear();
    }
}

/// Work buffered by an open section
#[derive(Debug)]
struct SectionBuffer {
    config: EncoderConfig,
    /// Bytes of committed columns; pending column bytes are tracked by the
    /// column transaction.
    committed_bytes: usize,
    data: BytesMut,
    columns: Vec<ColumnMetadata>,
}

/// Transaction writing one streams section.
///
/// Dropping the transaction without committing discards every column written
/// through it.
#[derive(Debug)]
pub struct StreamsEncoder<'a> {
    parent: &'a mut Encoder,
    buffer: SectionBuffer,
    closed: bool,
}

impl StreamsEncoder<'_> {
    /// Number of columns committed to this section so far
    pub fn columns(&self) -> usize {
        self.buffer.columns.len()
    }

    /// Open a transaction for a new column described by `info`.
    ///
    /// The returned guard discards the column when dropped unless
    /// [`ColumnEncoder::commit`] succeeds.
    pub fn open_column(
        &mut self,
        column_type: ColumnType,
        info: &ColumnInfo,
    ) -> Result<ColumnEncoder<'_>, EncodingError> {
        if let Some(limit) = self.buffer.config.max_section_columns {
            if self.buffer.columns.len() >= limit {
                return Err(EncodingError::TooManyColumns { limit });
            }
        }

        Ok(ColumnEncoder {
            section: &mut self.buffer,
            column_type,
            info: info.clone(),
            data: BytesMut::new(),
            pages: Vec::new(),
            rows: 0,
            closed: false,
        })
    }

    /// Make the section part of the data object.
    ///
    /// Fails if its columns do not all have the same number of rows.
    pub fn commit(mut self) -> Result<(), EncodingError> {
        let expected = self.buffer.columns.first().map_or(0, |c| c.info.rows_count);
        if let Some(column) = self
            .buffer
            .columns
            .iter()
            .find(|c| c.info.rows_count != expected)
        {
            return Err(EncodingError::MisalignedColumns {
                column: describe(column.column_type, &column.info),
                expected,
                actual: column.info.rows_count,
            });
        }

        let base = (MAGIC.len() + self.parent.data.len()) as u64;
        let mut columns = std::mem::take(&mut self.buffer.columns);
        for page in columns.iter_mut().flat_map(|c| c.pages.iter_mut()) {
            page.offset += base;
        }

        self.parent.data.put(std::mem::take(&mut self.buffer.data));
        self.parent.sections.push(SectionMetadata {
            kind: SectionKind::Streams,
            columns,
        });
        self.closed = true;
        debug!(
            "committed streams section {} ({} rows)",
            self.parent.sections.len() - 1,
            expected
        );
        Ok(())
    }

    /// Abandon the section and everything written to it
    pub fn discard(mut self) {
        self.closed = true;
        debug!(
            "discarded streams section with {} columns",
            self.buffer.columns.len()
        );
    }
}

impl Drop for StreamsEncoder<'_> {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                "discarding uncommitted streams section with {} columns",
                self.buffer.columns.len()
            );
        }
    }
}

/// Transaction writing one column of a section.
///
/// Dropping the transaction without committing discards its pages.
#[derive(Debug)]
pub struct ColumnEncoder<'s> {
    section: &'s mut SectionBuffer,
    column_type: ColumnType,
    info: ColumnInfo,
    data: BytesMut,
    /// Page offsets are relative to `data` until commit
    pages: Vec<PageDescriptor>,
    rows: usize,
    closed: bool,
}

impl ColumnEncoder<'_> {
    /// Append the next page of the column
    pub fn append_page(&mut self, page: Page) -> Result<(), EncodingError> {
        let mismatch = |reason: String| EncodingError::PageMismatch {
            column: describe(self.column_type, &self.info),
            reason,
        };
        if page.info.value_type != self.info.value_type {
            return Err(mismatch(format!(
                "value type {:?} != {:?}",
                page.info.value_type, self.info.value_type
            )));
        }
        if page.info.encoding != self.info.encoding {
            return Err(mismatch(format!(
                "encoding {:?} != {:?}",
                page.info.encoding, self.info.encoding
            )));
        }
        if page.info.compression != self.info.compression {
            return Err(mismatch(format!(
                "compression {:?} != {:?}",
                page.info.compression, self.info.compression
            )));
        }
        if page.data.len() != page.info.compressed_size {
            return Err(mismatch(format!(
                "{} stored bytes but info says {}",
                page.data.len(),
                page.info.compressed_size
            )));
        }

        if let Some(limit) = self.section.config.max_section_bytes {
            let size = self.section.committed_bytes + self.data.len() + page.data.len();
            if size > limit {
                return Err(EncodingError::SectionTooLarge { limit, size });
            }
        }

        self.pages.push(PageDescriptor {
            offset: self.data.len() as u64,
            info: page.info,
        });
        self.rows += self.pages.last().map_or(0, |p| p.info.rows_count);
        self.data.put(page.data);
        Ok(())
    }

    /// Add the column to its section.
    ///
    /// Fails if the appended pages do not hold exactly the number of rows the
    /// column info declares.
    pub fn commit(mut self) -> Result<(), EncodingError> {
        if self.rows != self.info.rows_count {
            return Err(EncodingError::RowCountMismatch {
                column: describe(self.column_type, &self.info),
                expected: self.info.rows_count,
                actual: self.rows,
            });
        }

        let base = self.section.data.len() as u64;
        let mut pages = std::mem::take(&mut self.pages);
        for page in &mut pages {
            page.offset += base;
        }

        let data = std::mem::take(&mut self.data);
        self.section.committed_bytes += data.len();
        self.section.data.put(data);
        self.section.columns.push(ColumnMetadata {
            column_type: self.column_type,
            info: self.info.clone(),
            pages,
        });
        self.closed = true;
        Ok(())
    }

    /// Abandon the column and its pages
    pub fn discard(mut self) {
        self.closed = true;
    }
}

impl Drop for ColumnEncoder<'_> {
    fn drop(&mut self) {
        if !self.closed {
            debug!(
                "discarding uncommitted {} column with {} pages",
                describe(self.column_type, &self.info),
                self.pages.len()
            );
        }
    }
}

fn describe(column_type: ColumnType, info: &ColumnInfo) -> String {
    if info.name.is_empty() {
        column_type.to_string()
    } else {
        format!("{column_type}:{}", info.name)
    }
}

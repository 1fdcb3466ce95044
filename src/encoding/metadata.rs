use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::dataset::{ColumnInfo, Page, PageInfo};

use super::error::EncodingError;

/// Magic bytes at the start and end of every data object
pub const MAGIC: &[u8; 4] = b"DOBJ";

/// Version of the metadata footer layout
pub const FORMAT_VERSION: u32 = 1;

/// Kind of a section within a data object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// List of streams present in the data object
    Streams,
}

/// Role of a column within a streams section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Stream identifier
    StreamId,
    /// Minimum timestamp of a stream, in nanoseconds since the epoch
    MinTimestamp,
    /// Maximum timestamp of a stream, in nanoseconds since the epoch
    MaxTimestamp,
    /// Number of rows recorded for a stream
    Rows,
    /// Value of one label; the label name is the column name
    Label,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::StreamId => "stream_id",
            ColumnType::MinTimestamp => "min_timestamp",
            ColumnType::MaxTimestamp => "max_timestamp",
            ColumnType::Rows => "rows",
            ColumnType::Label => "label",
        };
        f.write_str(name)
    }
}

/// Location and metadata of one stored page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Absolute offset of the page bytes in the data object
    pub offset: u64,
    /// Page metadata; `compressed_size` is the stored length
    pub info: PageInfo,
}

/// Metadata of one committed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Role of the column
    pub column_type: ColumnType,
    /// Column descriptor
    pub info: ColumnInfo,
    /// Pages in row order
    pub pages: Vec<PageDescriptor>,
}

impl ColumnMetadata {
    /// Slice this column's pages out of a complete data object
    pub fn read_pages(&self, object: &[u8]) -> Result<Vec<Page>, EncodingError> {
        self.pages
            .iter()
            .map(|desc| {
                let outside = || {
                    EncodingError::InvalidFile(format!(
                        "page at offset {} ({} bytes) is outside the {} byte object",
                        desc.offset,
                        desc.info.compressed_size,
                        object.len()
                    ))
                };
                let start = usize::try_from(desc.offset).map_err(|_| outside())?;
                let end = start
                    .checked_add(desc.info.compressed_size)
                    .filter(|&end| end <= object.len())
                    .ok_or_else(outside)?;
                Ok(Page {
                    info: desc.info.clone(),
                    data: Bytes::copy_from_slice(&object[start..end]),
                })
            })
            .collect()
    }
}

/// Metadata of one committed section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMetadata {
    /// Kind of section
    pub kind: SectionKind,
    /// Columns in write order
    pub columns: Vec<ColumnMetadata>,
}

impl SectionMetadata {
    /// Number of rows in the section (every column has the same count)
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.info.rows_count)
    }
}

/// Footer of a data object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Footer layout version
    pub format_version: u32,
    /// Committed sections in commit order
    pub sections: Vec<SectionMetadata>,
}

impl FileMetadata {
    /// Parse the footer of a complete data object.
    ///
    /// Only metadata is read; page contents are left untouched.
    pub fn read_from(object: &[u8]) -> Result<Self, EncodingError> {
        let min_len = MAGIC.len() * 2 + 4;
        if object.len() < min_len {
            return Err(EncodingError::InvalidFile(format!(
                "{} bytes is too short",
                object.len()
            )));
        }
        if &object[..MAGIC.len()] != MAGIC || &object[object.len() - MAGIC.len()..] != MAGIC {
            return Err(EncodingError::InvalidFile("missing magic bytes".into()));
        }

        let len_start = object.len() - MAGIC.len() - 4;
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&object[len_start..len_start + 4]);
        let metadata_len = u32::from_le_bytes(len_bytes) as usize;
        if metadata_len > len_start - MAGIC.len() {
            return Err(EncodingError::InvalidFile(format!(
                "metadata length {metadata_len} exceeds object"
            )));
        }

        let metadata: FileMetadata =
            serde_json::from_slice(&object[len_start - metadata_len..len_start])?;
        if metadata.format_version != FORMAT_VERSION {
            return Err(EncodingError::InvalidFile(format!(
                "unsupported format version {}",
                metadata.format_version
            )));
        }
        Ok(metadata)
    }
}

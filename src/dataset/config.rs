use serde::{Deserialize, Serialize};

use super::error::DatasetError;
use super::value::ValueType;

/// Valid zstd compression levels
const ZSTD_LEVELS: std::ops::RangeInclusive<i32> = 1..=22;

/// How values are laid out inside a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingType {
    /// Values stored one after another
    Plain,
    /// Integers stored as differences from the previous value
    Delta,
}

/// Compression applied to whole pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionType {
    /// Pages are stored as-is
    None,
    /// ZSTD compression at the given level
    Zstd {
        /// Compression level (1-22)
        level: i32,
    },
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd { level: 3 }
    }
}

/// Options for a [`ColumnBuilder`](super::ColumnBuilder)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Target size in bytes of a page's uncompressed values.
    /// A page is cut once appending another value would exceed it.
    pub page_size_hint: usize,

    /// Type of the values in the column
    pub value: ValueType,

    /// Value encoding within pages
    pub encoding: EncodingType,

    /// Page compression
    pub compression: CompressionType,
}

impl BuilderOptions {
    /// Options for a delta-encoded, uncompressed integer column
    pub fn int64(page_size_hint: usize) -> Self {
        Self {
            page_size_hint,
            value: ValueType::Int64,
            encoding: EncodingType::Delta,
            compression: CompressionType::None,
        }
    }

    /// Options for a plain-encoded string column
    pub fn string(page_size_hint: usize, compression: CompressionType) -> Self {
        Self {
            page_size_hint,
            value: ValueType::String,
            encoding: EncodingType::Plain,
            compression,
        }
    }

    pub(super) fn validate(&self, column: &str) -> Result<(), DatasetError> {
        let invalid = |reason: String| DatasetError::InvalidOptions {
            column: column.to_string(),
            reason,
        };

        if self.page_size_hint == 0 {
            return Err(invalid("page size hint must be greater than zero".into()));
        }
        if self.encoding == EncodingType::Delta && self.value != ValueType::Int64 {
            return Err(invalid(format!(
                "delta encoding is not supported for {:?} values",
                self.value
            )));
        }
        if let CompressionType::Zstd { level } = self.compression {
            if !ZSTD_LEVELS.contains(&level) {
                return Err(invalid(format!("zstd level {level} is outside 1-22")));
            }
        }
        Ok(())
    }
}

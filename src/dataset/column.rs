use serde::{Deserialize, Serialize};

use super::config::{CompressionType, EncodingType};
use super::page::Page;
use super::value::{Value, ValueType};

/// Minimum and maximum non-null values of a column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Smallest value, if any value is present
    pub min_value: Option<Value>,
    /// Largest value, if any value is present
    pub max_value: Option<Value>,
}

impl Statistics {
    pub(super) fn observe(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        let replace_min = match &self.min_value {
            None => true,
            Some(min) => value.partial_cmp_same_type(min).is_some_and(|o| o.is_lt()),
        };
        if replace_min {
            self.min_value = Some(value.clone());
        }
        let replace_max = match &self.max_value {
            None => true,
            Some(max) => value.partial_cmp_same_type(max).is_some_and(|o| o.is_gt()),
        };
        if replace_max {
            self.max_value = Some(value.clone());
        }
    }
}

/// Metadata describing a finished column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name; empty for unnamed columns
    pub name: String,
    /// Type of the values in the column
    pub value_type: ValueType,
    /// Value encoding used by every page
    pub encoding: EncodingType,
    /// Compression used by every page
    pub compression: CompressionType,
    /// Total rows, including nulls
    pub rows_count: usize,
    /// Total non-null values
    pub values_count: usize,
    /// Sum of page sizes before compression
    pub uncompressed_size: usize,
    /// Sum of stored page sizes
    pub compressed_size: usize,
    /// Value statistics
    pub statistics: Statistics,
}

/// A finished column: its metadata plus its pages in row order
#[derive(Debug, Clone)]
pub struct Column {
    /// Column metadata
    pub info: ColumnInfo,
    /// Encoded pages
    pub pages: Vec<Page>,
}

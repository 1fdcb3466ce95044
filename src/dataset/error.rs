use super::ValueType;

/// Errors that can occur while building or decoding columns
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Builder options are not a supported combination
    #[error("Invalid column options for {column:?}: {reason}")]
    InvalidOptions {
        /// Column name
        column: String,
        /// What is wrong with the options
        reason: String,
    },

    /// A row was appended at or before an already written row
    #[error("Out-of-order row {row}: column already has {rows} rows")]
    OutOfOrderRow {
        /// Row index that was supplied
        row: usize,
        /// Number of rows already in the column
        rows: usize,
    },

    /// A value of the wrong type was appended
    #[error("Value type mismatch: column holds {expected:?}, got {actual:?}")]
    ValueTypeMismatch {
        /// Value type of the column
        expected: ValueType,
        /// Value type that was supplied
        actual: ValueType,
    },

    /// Page compression or decompression failed
    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),

    /// Stored page bytes do not match their checksum
    #[error("Page checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum recorded in the page info
        expected: u32,
        /// Checksum of the stored bytes
        actual: u32,
    },

    /// Page bytes could not be parsed
    #[error("Corrupt page: {0}")]
    CorruptPage(String),
}

/// Errors that can occur while encoding a data object
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// The encoder already holds the maximum number of sections
    #[error("Data object already holds the maximum of {limit} sections")]
    TooManySections {
        /// Configured section limit
        limit: usize,
    },

    /// The section already holds the maximum number of columns
    #[error("Section already holds the maximum of {limit} columns")]
    TooManyColumns {
        /// Configured column limit
        limit: usize,
    },

    /// Appending a page would grow the section past its byte limit
    #[error("Section would grow to {size} bytes, exceeding the limit of {limit}")]
    SectionTooLarge {
        /// Configured byte limit
        limit: usize,
        /// Size the section would have reached
        size: usize,
    },

    /// A page does not match the column it was appended to
    #[error("Page does not match column {column:?}: {reason}")]
    PageMismatch {
        /// Column name
        column: String,
        /// What differs
        reason: String,
    },

    /// A column was committed with a different number of rows than declared
    #[error("Column {column:?} declares {expected} rows but {actual} were written")]
    RowCountMismatch {
        /// Column name
        column: String,
        /// Rows declared in the column info
        expected: usize,
        /// Rows in the appended pages
        actual: usize,
    },

    /// Columns of a section have different row counts
    #[error("Column {column:?} has {actual} rows, but the section has {expected}")]
    MisalignedColumns {
        /// Column name
        column: String,
        /// Row count of the first column
        expected: usize,
        /// Row count of the offending column
        actual: usize,
    },

    /// Bytes are not a valid data object
    #[error("Invalid data object: {0}")]
    InvalidFile(String),

    /// I/O error while writing the data object
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error serializing or parsing the metadata footer
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

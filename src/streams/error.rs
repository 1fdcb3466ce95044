use std::fmt;

use crate::dataset::DatasetError;
use crate::encoding::{ColumnType, EncodingError};

/// Errors that can occur while encoding a streams section
#[derive(Debug, thiserror::Error)]
pub enum StreamsError {
    /// A column builder could not be created
    #[error("Creating {column} column: {source}")]
    CreateColumn {
        /// Column being created
        column: String,
        /// Underlying error
        source: DatasetError,
    },

    /// A value could not be added to a column
    #[error("Appending row {row} to {column} column: {source}")]
    Append {
        /// Column being appended to
        column: String,
        /// Row index
        row: usize,
        /// Underlying error
        source: DatasetError,
    },

    /// A stream timestamp cannot be expressed in nanoseconds since the epoch
    #[error("Stream {stream_id} has a timestamp outside the nanosecond range")]
    TimestampOutOfRange {
        /// Offending stream
        stream_id: i64,
    },

    /// The section transaction could not be opened
    #[error("Opening streams section: {0}")]
    OpenSection(#[source] EncodingError),

    /// One or more of the fixed columns failed to encode
    #[error("Encoding columns: {0}")]
    EncodeColumns(#[source] ColumnErrors),

    /// A label column failed to encode
    #[error("Encoding label column {name:?}: {source}")]
    EncodeLabelColumn {
        /// Label name
        name: String,
        /// Underlying error
        source: ColumnError,
    },

    /// The section transaction could not be committed
    #[error("Committing streams section: {0}")]
    CommitSection(#[source] EncodingError),
}

/// Failure writing a single column, tagged with the phase it failed in
#[derive(Debug, thiserror::Error)]
pub enum ColumnError {
    /// Finalizing the builder into pages failed
    #[error("flushing {column_type} column: {source}")]
    Flush {
        /// Column that failed
        column_type: ColumnType,
        /// Underlying error
        source: DatasetError,
    },

    /// Padding the column to the section row count failed
    #[error("backfilling {column_type} column to {rows} rows: {source}")]
    Backfill {
        /// Column that failed
        column_type: ColumnType,
        /// Row count the column was padded to
        rows: usize,
        /// Underlying error
        source: DatasetError,
    },

    /// Opening the column transaction failed
    #[error("opening {column_type} column encoder: {source}")]
    Open {
        /// Column that failed
        column_type: ColumnType,
        /// Underlying error
        source: EncodingError,
    },

    /// Appending a page failed
    #[error("appending {column_type} page {page}: {source}")]
    AppendPage {
        /// Column that failed
        column_type: ColumnType,
        /// Index of the page within the column
        page: usize,
        /// Underlying error
        source: EncodingError,
    },

    /// Committing the column transaction failed
    #[error("committing {column_type} column: {source}")]
    Commit {
        /// Column that failed
        column_type: ColumnType,
        /// Underlying error
        source: EncodingError,
    },
}

impl ColumnError {
    /// Column the error belongs to
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnError::Flush { column_type, .. }
            | ColumnError::Backfill { column_type, .. }
            | ColumnError::Open { column_type, .. }
            | ColumnError::AppendPage { column_type, .. }
            | ColumnError::Commit { column_type, .. } => *column_type,
        }
    }
}

/// Every failure from a group of columns that were all attempted
#[derive(Debug)]
pub struct ColumnErrors(pub(super) Vec<ColumnError>);

impl ColumnErrors {
    /// Individual column failures, in column order
    pub fn errors(&self) -> &[ColumnError] {
        &self.0
    }
}

impl fmt::Display for ColumnErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ColumnErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.first().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

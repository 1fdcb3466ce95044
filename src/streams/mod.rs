//! # Streams Module
//!
//! The streams section holds the list of streams present in a data object.
//!
//! [`Streams`] deduplicates label sets into [`Stream`] records as rows are
//! ingested, assigning each new stream the next ID (starting at 1) and
//! tracking its timestamp range and row count. At section-close time,
//! [`Streams::encode_to`] turns the registry into columns and writes them as a
//! single section:
//!
//! | Column | Value type | Encoding | Compression |
//! |--------|------------|----------|-------------|
//! | stream_id | Int64 | Delta | None |
//! | min_timestamp | Int64 (ns) | Delta | None |
//! | max_timestamp | Int64 (ns) | Delta | None |
//! | rows | Int64 | Delta | None |
//! | one per label name | String | Plain | Zstd (configurable) |
//!
//! Label columns appear in the order their names were first seen while
//! walking streams in record order. Streams without a given label hold null
//! in that column.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dataobj_streams::encoding::Encoder;
//! use dataobj_streams::labels::Labels;
//! use dataobj_streams::streams::Streams;
//!
//! let mut streams = Streams::new();
//! let labels = Labels::from_pairs([("app", "api"), ("env", "prod")]);
//! let id = streams.record(&labels, Utc.timestamp_nanos(100));
//! assert_eq!(id, 1);
//!
//! let mut encoder = Encoder::new();
//! let stats = streams.encode_to(&mut encoder, 1024 * 1024)?;
//! assert_eq!(stats.columns, 6);
//! # Ok::<(), dataobj_streams::streams::StreamsError>(())
//! ```

mod config;
mod encode;
mod error;
mod registry;
mod shared;
mod stream;

#[cfg(test)]
mod tests;

pub use config::{StreamsConfig, DEFAULT_PAGE_SIZE_HINT};
pub use encode::SectionStats;
pub use error::{ColumnError, ColumnErrors, StreamsError};
pub use registry::Streams;
pub use shared::SharedStreams;
pub use stream::Stream;

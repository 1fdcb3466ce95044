//! # dataobj-streams - Stream Registry and Streams Section Encoder
//!
//! `dataobj_streams` tracks the streams (unique label sets) seen while
//! ingesting logs into a data object, and encodes them into a columnar,
//! page-oriented streams section.
//!
//! ## Key Features
//!
//! - **Deduplication**: Label sets are canonicalized, hashed, and compared as
//!   sets, so `{app="a", env="prod"}` and `{env="prod", app="a"}` are the same
//!   stream.
//!
//! - **Stable IDs**: Each new stream gets the next ID, starting at 1.
//!
//! - **Per-stream Aggregates**: Minimum and maximum timestamp (UTC) and row
//!   count.
//!
//! - **Dynamic Schema**: Every distinct label name becomes its own column,
//!   ordered by first appearance.
//!
//! - **Transactional Writes**: Sections and columns are written through
//!   guards that discard their work unless explicitly committed.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dataobj_streams::encoding::{Encoder, FileMetadata};
//! use dataobj_streams::labels::Labels;
//! use dataobj_streams::streams::Streams;
//!
//! let mut streams = Streams::new();
//! streams.record(
//!     &Labels::from_pairs([("app", "a"), ("env", "prod")]),
//!     Utc.timestamp_nanos(100),
//! );
//! streams.record(
//!     &Labels::from_pairs([("env", "prod"), ("app", "a")]),
//!     Utc.timestamp_nanos(50),
//! );
//!
//! let mut encoder = Encoder::new();
//! streams.encode_to(&mut encoder, 1024 * 1024)?;
//!
//! let mut object = Vec::new();
//! encoder.flush(&mut object)?;
//!
//! let metadata = FileMetadata::read_from(&object)?;
//! assert_eq!(metadata.sections[0].columns.len(), 6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`labels`]: Label-set type with order-independent hashing and equality
//! - [`dataset`]: Typed column builders and the page codec
//! - [`encoding`]: Transactional section/column writer and data object layout
//! - [`streams`]: Stream registry and streams section encoder

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod dataset;
pub mod encoding;
pub mod labels;
pub mod streams;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::dataset::{
        BuilderOptions, Column, ColumnBuilder, ColumnInfo, CompressionType, DatasetError,
        EncodingType, Page, PageInfo, Value, ValueType,
    };
    pub use crate::encoding::{
        ColumnType, Encoder, EncoderConfig, EncodingError, FileMetadata, SectionKind,
    };
    pub use crate::labels::{Label, Labels};
    pub use crate::streams::{
        SectionStats, SharedStreams, Stream, Streams, StreamsConfig, StreamsError,
        DEFAULT_PAGE_SIZE_HINT,
    };
}

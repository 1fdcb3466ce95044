//! # Encoding Module
//!
//! Transactional writer for data objects.
//!
//! Writing follows an open → write → commit protocol at two levels:
//!
//! 1. [`Encoder::open_streams`] opens a section transaction ([`StreamsEncoder`]).
//! 2. [`StreamsEncoder::open_column`] opens a column transaction
//!    ([`ColumnEncoder`]) nested inside it; pages are appended and the column
//!    is committed into the section.
//! 3. [`StreamsEncoder::commit`] makes the section part of the object.
//!
//! Both transaction types discard their buffered work when dropped without a
//! successful commit, so an early return or `?` never leaves a partial section
//! behind. Only one section and one column per section can be open at a time;
//! the borrow checker enforces this.
//!
//! ## Data Object Layout
//!
//! ```text
//! "DOBJ" | page bytes ... | metadata (JSON) | u32 LE metadata length | "DOBJ"
//! ```

mod config;
mod encoder;
mod error;
mod metadata;

#[cfg(test)]
mod tests;

pub use config::EncoderConfig;
pub use encoder::{ColumnEncoder, Encoder, StreamsEncoder};
pub use error::EncodingError;
pub use metadata::{
    ColumnMetadata, ColumnType, FileMetadata, PageDescriptor, SectionKind, SectionMetadata,
    FORMAT_VERSION, MAGIC,
};

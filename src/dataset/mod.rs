//! # Dataset Module
//!
//! Typed column builders and the page codec used by every section of a data
//! object.
//!
//! A [`ColumnBuilder`] accepts values at strictly increasing row indices,
//! buffers them in Arrow builders, and cuts a [`Page`] whenever the page size
//! hint is reached. [`ColumnBuilder::flush`] returns a [`Column`]: a
//! [`ColumnInfo`] descriptor plus the ordered pages, ready to be handed to an
//! [`encoding`](crate::encoding) column transaction.
//!
//! ## Supported layouts
//!
//! | Value type | Encodings | Compression |
//! |------------|-----------|-------------|
//! | Int64 | Plain, Delta | None, Zstd |
//! | String | Plain | None, Zstd |

mod builder;
mod column;
mod config;
mod error;
mod page;
mod value;


pub use builder::ColumnBuilder;
pub use column::{Column, ColumnInfo, Statistics};
pub use config::{BuilderOptions, CompressionType, EncodingType};
pub use error::DatasetError;
pub use page::{Page, PageInfo};
pub use value::{Value, ValueType};

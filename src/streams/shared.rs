use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use parking_lot::{Mutex, MutexGuard};

use crate::encoding::Encoder;
use crate::labels::Labels;

use super::config::StreamsConfig;
use super::encode::SectionStats;
use super::error::StreamsError;
use super::registry::Streams;

/// A [`Streams`] registry that can be shared between producer threads.
///
/// Every operation holds one lock for its whole duration, so assigning a
/// stream ID and inserting the stream into the registry happen as one unit.
#[derive(Debug, Clone, Default)]
pub struct SharedStreams {
    inner: Arc<Mutex<Streams>>,
}

impl SharedStreams {
    /// Create an empty shared registry with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty shared registry with the given configuration
    pub fn with_config(config: StreamsConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Streams::with_config(config))),
        }
    }

    /// See [`Streams::record`]
    pub fn record<Tz: TimeZone>(&self, labels: &Labels, ts: DateTime<Tz>) -> i64 {
        self.inner.lock().record(labels, ts)
    }

    /// See [`Streams::lookup_id`]
    pub fn lookup_id(&self, labels: &Labels) -> Option<i64> {
        self.inner.lock().lookup_id(labels)
    }

    /// See [`Streams::reset`]
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no stream has been recorded
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// See [`Streams::encode_to`]. Recording blocks until encoding finishes.
    pub fn encode_to(
        &self,
        enc: &mut Encoder,
        page_size_hint: usize,
    ) -> Result<SectionStats, StreamsError> {
        self.inner.lock().encode_to(enc, page_size_hint)
    }

    /// Lock the registry for a sequence of operations
    pub fn lock(&self) -> MutexGuard<'_, Streams> {
        self.inner.lock()
    }
}

use chrono::{DateTime, Utc};

use crate::labels::Labels;

/// An individual stream within a data object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    /// Identifier of the stream. Valid IDs start at 1 and are unique within
    /// one registry lifetime.
    pub id: i64,

    /// Stream labels, in canonical order
    pub labels: Labels,

    /// Earliest recorded timestamp; `None` until the first record
    pub min_timestamp: Option<DateTime<Utc>>,

    /// Latest recorded timestamp; `None` until the first record
    pub max_timestamp: Option<DateTime<Utc>>,

    /// Number of records attributed to the stream
    pub rows: usize,
}

impl Stream {
    pub(super) fn new(id: i64, labels: Labels) -> Self {
        debug_assert!(labels.is_sorted());
        Self {
            id,
            labels,
            min_timestamp: None,
            max_timestamp: None,
            rows: 0,
        }
    }

    /// Widen the timestamp range to include `ts` and count one more row
    pub(super) fn observe(&mut self, ts: DateTime<Utc>) {
        if self.min_timestamp.map_or(true, |min| ts < min) {
            self.min_timestamp = Some(ts);
        }
        if self.max_timestamp.map_or(true, |max| ts > max) {
            self.max_timestamp = Some(ts);
        }
        self.rows += 1;
    }
}

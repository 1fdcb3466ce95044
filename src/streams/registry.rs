use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use log::trace;

use crate::labels::Labels;

use super::config::StreamsConfig;
use super::stream::Stream;

/// Tracks the streams present in a data object.
///
/// Streams live in `ordered`, in the order they were first recorded; that is
/// the order they are encoded in. `lookup` maps a label hash to the slots of
/// every stream sharing that hash. Because IDs are handed out sequentially as
/// streams are appended, the stream with ID `n` always lives in slot `n - 1`.
///
/// Mutating operations take `&mut self`, so a `Streams` has a single writer.
/// Use [`SharedStreams`](super::SharedStreams) to record from several
/// threads.
#[derive(Debug, Default)]
pub struct Streams {
    pub(super) config: StreamsConfig,
    last_id: i64,
    lookup: HashMap<u64, Vec<usize>>,
    pub(super) ordered: Vec<Stream>,
}

impl Streams {
    /// Create an empty registry with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given configuration
    pub fn with_config(config: StreamsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Record one row for the stream identified by `labels`.
    ///
    /// The timestamp is normalized to UTC and widens the stream's timestamp
    /// range; each call counts as one row. Returns the stream ID.
    pub fn record<Tz: TimeZone>(&mut self, labels: &Labels, ts: DateTime<Tz>) -> i64 {
        let ts = ts.with_timezone(&Utc);
        let slot = self.get_or_add(labels);
        let stream = &mut self.ordered[slot];
        stream.observe(ts);
        stream.id
    }

    /// ID of the stream identified by `labels`, or `None` if it has never
    /// been recorded
    pub fn lookup_id(&self, labels: &Labels) -> Option<i64> {
        let canonical = canonicalize(labels);
        self.find(Labels::hash(&canonical), &canonical)
            .map(|slot| self.ordered[slot].id)
    }

    /// Stream with the given ID
    pub fn get(&self, id: i64) -> Option<&Stream> {
        let slot = usize::try_from(id).ok()?.checked_sub(1)?;
        self.ordered.get(slot)
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether no stream has been recorded
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Streams in the order they were first recorded
    pub fn iter(&self) -> std::slice::Iter<'_, Stream> {
        self.ordered.iter()
    }

    /// Drop all streams so the registry can be reused. The next recorded
    /// stream gets ID 1 again.
    pub fn reset(&mut self) {
        self.last_id = 0;
        self.lookup.clear();
        self.ordered.clear();
    }

    fn get_or_add(&mut self, labels: &Labels) -> usize {
        let canonical = canonicalize(labels);
        let hash = Labels::hash(&canonical);
        match self.find(hash, &canonical) {
            Some(slot) => slot,
            None => self.add(hash, canonical.into_owned()),
        }
    }

    fn find(&self, hash: u64, canonical: &Labels) -> Option<usize> {
        self.lookup
            .get(&hash)?
            .iter()
            .copied()
            .find(|&slot| self.ordered[slot].labels.set_eq(canonical))
    }

    fn add(&mut self, hash: u64, labels: Labels) -> usize {
        self.last_id += 1;
        let slot = self.ordered.len();
        trace!("new stream {} {}", self.last_id, labels);

        self.ordered.push(Stream::new(self.last_id, labels));
        self.lookup.entry(hash).or_default().push(slot);
        slot
    }
}

/// Sorted view of `labels`, copying only when they are out of order
fn canonicalize(labels: &Labels) -> Cow<'_, Labels> {
    if labels.is_sorted() {
        Cow::Borrowed(labels)
    } else {
        Cow::Owned(labels.canonical())
    }
}

impl<'a> IntoIterator for &'a Streams {
    type Item = &'a Stream;
    type IntoIter = std::slice::Iter<'a, Stream>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(value: &str) -> Labels {
        Labels::from_pairs([("app", value)])
    }

    #[test]
    fn test_collision_chain_distinguishes_sets() {
        let mut streams = Streams::new();
        let a = labels("a");
        let b = labels("b");

        assert_eq!(streams.add(42, a.clone()), 0);
        assert_eq!(streams.add(42, b.clone()), 1);
        assert_eq!(streams.lookup[&42], vec![0, 1]);

        assert_eq!(streams.find(42, &a), Some(0));
        assert_eq!(streams.find(42, &b), Some(1));
        assert_eq!(streams.find(42, &labels("c")), None);
        assert_eq!(streams.find(7, &a), None);
    }

    #[test]
    fn test_lookup_and_record_walk_the_chain() {
        let mut streams = Streams::new();
        let a = labels("a");
        let b = labels("b");

        // Put `b` ahead of `a` in the bucket `a` hashes to
        let hash = Labels::hash(&a);
        streams.add(hash, b.clone());
        streams.add(hash, a.clone());

        assert_eq!(streams.lookup_id(&a), Some(2));
        assert_eq!(streams.record(&a, Utc.timestamp_nanos(5)), 2);
        assert_eq!(streams.len(), 2);
        assert_eq!(streams.get(2).map(|s| s.rows), Some(1));
        assert_eq!(streams.get(1).map(|s| s.rows), Some(0));
    }
}

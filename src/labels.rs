//! # Label Sets
//!
//! A label set is an unordered collection of name/value pairs that identifies a
//! stream. [`Labels`] keeps the pairs in a `Vec` and offers a canonical (sorted)
//! view that both hashing and equality are defined over, so the order a caller
//! presents labels in never affects stream identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// Byte written between names and values when hashing. It cannot occur in
/// valid UTF-8, so `{a="bc"}` and `{ab="c"}` never hash the same input.
const HASH_SEP: u8 = 0xff;

/// A single name/value pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Label value
    pub value: String,
}

impl Label {
    /// Create a new label
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A set of labels identifying a stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels(Vec<Label>);

impl Labels {
    /// Create a label set from a list of labels, keeping the given order
    pub fn new(labels: Vec<Label>) -> Self {
        Self(labels)
    }

    /// Create a label set from `(name, value)` pairs
    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(name, value)| Label::new(name, value))
            .collect()
    }

    /// Number of labels in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no labels
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over labels in their stored order
    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.0.iter()
    }

    /// Value of the label called `name`, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    /// Sort labels into canonical `(name, value)` order in place
    pub fn sort(&mut self) {
        self.0.sort_unstable();
    }

    /// Whether the labels are already in canonical order
    pub fn is_sorted(&self) -> bool {
        self.0.windows(2).all(|w| w[0] <= w[1])
    }

    /// Sorted copy of this label set
    pub fn canonical(&self) -> Labels {
        let mut sorted = self.clone();
        sorted.sort();
        sorted
    }

    /// Stable 64-bit hash over the canonical form of the set.
    ///
    /// Two label sets that are equal as sets always hash the same, regardless
    /// of the order their labels were supplied in.
    pub fn hash(&self) -> u64 {
        if self.is_sorted() {
            return hash_sorted(&self.0);
        }
        let mut sorted: Vec<&Label> = self.0.iter().collect();
        sorted.sort_unstable();
        hash_sorted(sorted)
    }

    /// Set equality: same names and values, independent of order
    pub fn set_eq(&self, other: &Labels) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        match (self.is_sorted(), other.is_sorted()) {
            (true, true) => self.0 == other.0,
            _ => self.canonical().0 == other.canonical().0,
        }
    }
}

fn hash_sorted<'a>(labels: impl IntoIterator<Item = &'a Label>) -> u64 {
    let mut hasher = Xxh3::new();
    for label in labels {
        hasher.update(label.name.as_bytes());
        hasher.update(&[HASH_SEP]);
        hasher.update(label.value.as_bytes());
        hasher.update(&[HASH_SEP]);
    }
    hasher.digest()
}

impl FromIterator<Label> for Labels {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for Labels {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter()
            .map(|(name, value)| Label { name, value })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Labels {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:?}", label.name, label.value)?;
        }
        f.write_str("}")
    }
}

//! A bucket holds every posting for one token.

use hashbrown::HashMap;

/// One (reference row index, accumulated weight) pair inside a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    /// Zero-based ordinal of the reference row.
    pub index: usize,
    /// Accumulated header weight for this (token, row) pair.
    pub weight: f64,
}

/// All postings for a single token, deduplicated by row index.
///
/// Postings keep insertion order. When the same (token, row) pair arrives
/// again, for example when two headers of one group both produce the token,
/// the weights are added into the existing posting instead of appending a
/// duplicate. The row-index lookup that backs the dedup is a derived
/// structure: it is not serialized and is rebuilt after a snapshot load.
///
/// # Limitations
///
/// * A bucket does not know its own token; the owning pool keys it
/// * Weights are additive only - there is no removal, matching the
///   build-once lifecycle of the index
///
/// # Examples
///
/// ```
/// use fuzzylink::index::{Bucket, Posting};
///
/// let mut bucket = Bucket::new();
/// bucket.add(Posting { index: 3, weight: 0.4 });
/// bucket.add(Posting { index: 3, weight: 0.6 });
/// assert_eq!(bucket.size(), 1);
/// assert!((bucket.entries()[0].weight - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bucket {
    postings: Vec<Posting>,
    lookup: HashMap<usize, usize>, // row index -> position in postings
}

impl Bucket {
    /// Creates an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a posting, merging additively when the row index is already
    /// present.
    ///
    /// # Arguments
    ///
    /// * `posting` - The (row index, weight) pair to file
    pub fn add(&mut self, posting: Posting) {
        match self.lookup.get(&posting.index) {
            Some(&pos) => self.postings[pos].weight += posting.weight,
            None => {
                self.lookup.insert(posting.index, self.postings.len());
                self.postings.push(posting);
            }
        }
    }

    /// Number of distinct row indices in the bucket.
    ///
    /// This is the bucket size that feeds the scoring-side damping filter:
    /// tokens held by many rows contribute less per row.
    pub fn size(&self) -> usize {
        self.postings.len()
    }

    /// Postings in insertion order.
    pub fn entries(&self) -> &[Posting] {
        &self.postings
    }

    /// Rebuilds a bucket from already-deduplicated postings, restoring the
    /// row-index lookup. Used when reconstructing an engine from a snapshot.
    ///
    /// # Arguments
    ///
    /// * `postings` - Deduplicated postings in their original insertion order
    ///
    /// # Returns
    ///
    /// A bucket equivalent to the one the postings were taken from.
    pub fn from_postings(postings: Vec<Posting>) -> Self {
        let mut bucket = Self {
            postings,
            lookup: HashMap::new(),
        };
        bucket.rebuild_lookup();
        bucket
    }

    /// Recomputes the row-index lookup from the posting list.
    ///
    /// The lookup is skipped during serialization; call this after restoring
    /// the posting list from a snapshot.
    pub fn rebuild_lookup(&mut self) {
        self.lookup.clear();
        for (pos, posting) in self.postings.iter().enumerate() {
            self.lookup.insert(posting.index, pos);
        }
    }
}

//! The inverted index owned by one reference group.

use hashbrown::HashMap;

use crate::index::bucket::{Bucket, Posting};

/// Token → bucket mapping for a single reference group.
///
/// A pool is filled once during reference ingestion and read-only from then
/// on. Placement goes through `entry_ref` so the common case, a token that
/// is already present, costs one hash and no allocation.
///
/// # Examples
///
/// ```
/// use fuzzylink::index::{Pool, Posting};
///
/// let mut pool = Pool::new();
/// pool.place("acme", Posting { index: 0, weight: 1.0 });
/// pool.place("acme", Posting { index: 1, weight: 0.5 });
///
/// let bucket = pool.get("acme").unwrap();
/// assert_eq!(bucket.size(), 2);
/// assert!(pool.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pool {
    buckets: HashMap<String, Bucket>,
}

impl Pool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the bucket for a token, if any.
    pub fn get(&self, token: &str) -> Option<&Bucket> {
        self.buckets.get(token)
    }

    /// Places a posting under a token, creating the bucket on first sight.
    ///
    /// # Arguments
    ///
    /// * `token` - The token the posting belongs to
    /// * `posting` - The (row index, weight) pair; same-row postings merge
    ///   additively inside the bucket
    pub fn place(&mut self, token: &str, posting: Posting) {
        self.buckets
            .entry_ref(token)
            .or_insert_with(Bucket::new)
            .add(posting);
    }

    /// Number of distinct tokens in the pool.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterates (token, bucket) pairs in arbitrary order. Callers that need
    /// a stable order (snapshots) sort the tokens themselves.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bucket)> {
        self.buckets.iter().map(|(token, bucket)| (token.as_str(), bucket))
    }

    /// Inserts a fully-built bucket under a token. Used when reconstructing
    /// a pool from a snapshot; replaces any existing bucket.
    pub fn insert_bucket(&mut self, token: String, bucket: Bucket) {
        self.buckets.insert(token, bucket);
    }
}

//! The token index: postings, buckets, and the per-group pool.
//!
//! One [`pool::Pool`] is owned by each reference-side group. It maps every
//! token observed on that group's headers to a [`bucket::Bucket`] holding the
//! (row index, weight) postings. Pools are write-once: filled during
//! reference ingestion, read-only afterwards.

pub mod bucket;
pub mod pool;

pub use bucket::{Bucket, Posting};
pub use pool::Pool;

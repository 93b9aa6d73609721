//! Tuning parameters for tokenization and score aggregation.
//!
//! Every magic constant of the engine lives here as a field of
//! [`ScoringProfile`] so it can be inspected, swapped in tests, and carried
//! inside persisted snapshots. The defaults are normative: scores produced
//! with a modified profile are not comparable to scores produced with the
//! default one.

/// Cut sizes used when shredding a word into overlapping substrings.
///
/// Sizes 10 and 17 appear twice on purpose: tokens of those lengths are
/// emitted twice, doubling their evidence. Words shorter than a cut size
/// skip that size.
pub const DEFAULT_CUT_SIZES: &[usize] = &[4, 5, 7, 8, 10, 10, 13, 14, 15, 17, 17];

/// Sliding-window sizes for space-joined n-gram tokens.
pub const DEFAULT_NGRAM_WINDOWS: &[usize] = &[2, 3, 4];

/// Tuning parameters shared by the tokenizer and the scoring pipeline.
///
/// The length weight discounts short token matches (cheap, noisy) and grows
/// smoothly with token length:
///
/// ```text
/// L = max(0, exp((|token| + length_shift) / length_scale)
///            - exp(length_shift / length_scale)
///            - length_margin)
/// ```
///
/// The bucket filter damps tokens that appear in many postings:
///
/// ```text
/// F = bucket_scale / (bucket_size + bucket_offset) + 0.5
/// ```
///
/// The sentinel replication counts interact non-linearly with the bucket
/// filter; they are preserved exactly from the tuned system rather than
/// re-derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringProfile {
    /// `c` in the length weight.
    pub length_scale: f64,
    /// `s` in the length weight.
    pub length_shift: f64,
    /// `m` in the length weight.
    pub length_margin: f64,
    /// `c2` in the bucket filter.
    pub bucket_scale: f64,
    /// `h` in the bucket filter.
    pub bucket_offset: f64,

    /// Substring cut schedule (duplicated sizes emit twice).
    pub cut_sizes: Vec<usize>,
    /// Sliding-window sizes for n-gram tokens.
    pub ngram_windows: Vec<usize>,

    /// Inputs longer than this get the long whole-input sentinel.
    pub long_input_len: usize,
    /// Inputs longer than this (but not long) get the medium sentinel.
    pub medium_input_len: usize,
    /// Replication count for the long whole-input sentinel.
    pub long_sentinel_repeat: usize,
    /// Replication count for the medium whole-input sentinel.
    pub medium_sentinel_repeat: usize,
    /// Replication count for numeric identifiers (4+ digits).
    pub numeric_id_repeat: usize,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            length_scale: 2.0,
            length_shift: -7.0,
            length_margin: 0.2,
            bucket_scale: 10.0,
            bucket_offset: 0.7,
            cut_sizes: DEFAULT_CUT_SIZES.to_vec(),
            ngram_windows: DEFAULT_NGRAM_WINDOWS.to_vec(),
            long_input_len: 10,
            medium_input_len: 7,
            long_sentinel_repeat: 400,
            medium_sentinel_repeat: 100,
            numeric_id_repeat: 3,
        }
    }
}

impl ScoringProfile {
    /// Length weight `L` for a token of `token_len` characters.
    ///
    /// Clamped at zero so very short tokens contribute nothing rather than
    /// a negative amount.
    pub fn length_weight(&self, token_len: usize) -> f64 {
        let x = token_len as f64;
        let l = ((x + self.length_shift) / self.length_scale).exp()
            - (self.length_shift / self.length_scale).exp()
            - self.length_margin;
        l.max(0.0)
    }

    /// Bucket filter `F` for a bucket holding `bucket_size` distinct rows.
    pub fn bucket_filter(&self, bucket_size: usize) -> f64 {
        self.bucket_scale / (bucket_size as f64 + self.bucket_offset) + 0.5
    }
}

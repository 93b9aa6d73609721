//! Similarity coefficients between a query row and a reference row.
//!
//! Three measures, all in `[0, 1]`:
//!
//! * `damerau` - normalized Damerau-Levenshtein over the rows' header-ordered,
//!   lexicographically sorted, space-joined values.
//! * `jaccard` - set overlap of the rows' values, order-blind.
//! * `levenshtein_transposition` - optimal string alignment distance (plain
//!   Levenshtein plus an adjacent-transposition move), used inside the
//!   weighted blend.
//!
//! The blend weights favour Damerau: transposed words and single-character
//! typos dominate the messy data this engine is pointed at.

use crate::backbone::{Backbone, Side};
use crate::table::Row;

/// Weight of the Damerau term in the blended score.
const ALPHA: f64 = 0.6;
/// Weight of the Jaccard term.
const BETA: f64 = 0.15;
/// Weight of the transposition-Levenshtein term.
const GAMMA: f64 = 0.25;

/// Row-level similarity built over a backbone's input-header lists.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityComparator<'a> {
    backbone: &'a Backbone,
}

impl<'a> SimilarityComparator<'a> {
    pub fn new(backbone: &'a Backbone) -> Self {
        Self { backbone }
    }

    /// Normalized Damerau-Levenshtein similarity between a query row and a
    /// reference row. Returns 1.0 when both concatenations are empty.
    pub fn damerau(&self, target: &Row, reference: &Row) -> f64 {
        let target_values = self.concat_sorted_values(target, Side::Target);
        let reference_values = self.concat_sorted_values(reference, Side::Reference);
        let distance = strsim::damerau_levenshtein(&target_values, &reference_values);
        normalize_distance(
            distance as f64,
            target_values.chars().count(),
            reference_values.chars().count(),
        )
    }

    /// Jaccard similarity over the two rows' value sets. Returns 1.0 when
    /// the union is empty.
    pub fn jaccard(&self, target: &Row, reference: &Row) -> f64 {
        let target_values: std::collections::HashSet<&str> =
            target.values().map(String::as_str).collect();
        let reference_values: std::collections::HashSet<&str> =
            reference.values().map(String::as_str).collect();

        let union = target_values.union(&reference_values).count();
        if union == 0 {
            return 1.0;
        }
        let intersection = target_values.intersection(&reference_values).count();
        intersection as f64 / union as f64
    }

    /// Blended similarity used for re-sorting candidate lists:
    /// `0.6·damerau + 0.15·jaccard + 0.25·normalized OSA`.
    pub fn blended(&self, query: &Row, reference: &Row) -> f64 {
        let query_values = self.concat_sorted_values(query, Side::Target);
        let reference_values = self.concat_sorted_values(reference, Side::Reference);

        let damerau_distance = strsim::damerau_levenshtein(&query_values, &reference_values);
        let damerau_sim = normalize_distance(
            damerau_distance as f64,
            query_values.chars().count(),
            reference_values.chars().count(),
        );

        let jaccard_sim = self.jaccard(query, reference);

        let transposition_distance = levenshtein_transposition(&query_values, &reference_values);
        let transposition_sim = normalize_distance(
            transposition_distance as f64,
            query_values.chars().count(),
            reference_values.chars().count(),
        );

        ALPHA * damerau_sim + BETA * jaccard_sim + GAMMA * transposition_sim
    }

    /// Sorts reference rows by descending blended similarity to the query.
    pub fn sort_by_similarity(&self, query: &Row, mut references: Vec<Row>) -> Vec<Row> {
        let mut scored: Vec<(f64, Row)> = references
            .drain(..)
            .map(|reference| (self.blended(query, &reference), reference))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, row)| row).collect()
    }

    /// Selects the row's values in the side's input-header order, sorts them
    /// lexicographically, and joins with single spaces.
    fn concat_sorted_values(&self, row: &Row, side: Side) -> String {
        let mut values: Vec<&str> = self
            .backbone
            .input_headers(side)
            .into_iter()
            .filter_map(|header| row.get(header).map(String::as_str))
            .collect();
        values.sort_unstable();
        values.join(" ")
    }
}

/// Levenshtein distance extended with an adjacent-transposition move
/// (optimal string alignment).
pub fn levenshtein_transposition(a: &str, b: &str) -> usize {
    strsim::osa_distance(a, b)
}

/// `1 − d / max(len1, len2)`, or 1.0 when both strings are empty.
fn normalize_distance(distance: f64, len1: usize, len2: usize) -> f64 {
    let max_len = len1.max(len2) as f64;
    if max_len == 0.0 {
        1.0
    } else {
        1.0 - distance / max_len
    }
}

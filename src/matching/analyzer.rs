//! Per-query scratch state.
//!
//! A [`QueryAnalyzer`] owns everything a single lookup mutates: the tokenized
//! query cells, the token lists routed to each target group, and the
//! candidate accumulator. Because all of it lives here, the backbone and the
//! reference pools stay read-only during queries and lookups can run
//! concurrently over one engine.
//!
//! The accumulator is a max-heap with lazy deletion: `increase` pushes a
//! fresh heap entry instead of re-heapifying, and `drain_sorted` skips
//! entries whose weight no longer matches the candidate map. Weights only
//! grow, so for every candidate the entry carrying its final weight is the
//! first one popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::profile::ScoringProfile;
use crate::table::Row;
use crate::tokenizer::tokenize;

/// Heap entry for one observed (candidate, weight) state.
#[derive(Debug, Clone, Copy)]
struct CandidateEntry {
    weight: f64,
    index: usize,
}

impl PartialEq for CandidateEntry {
    fn eq(&self, other: &Self) -> bool {
        self.weight.to_bits() == other.weight.to_bits() && self.index == other.index
    }
}

impl Eq for CandidateEntry {}

impl Ord for CandidateEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap by weight; equal weights yield the smaller row index
        // first so drain order is fully deterministic.
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for CandidateEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Scratch state for one query row.
#[derive(Debug, Default)]
pub struct QueryAnalyzer {
    tokenized: IndexMap<String, Vec<String>>,
    group_tokens: IndexMap<String, Vec<String>>,
    weights: HashMap<usize, f64>,
    heap: BinaryHeap<CandidateEntry>,
}

impl QueryAnalyzer {
    /// Tokenizes each input header's cell up front. Headers missing from the
    /// row contribute an empty token list, so incomplete query rows score on
    /// whatever they do have.
    pub fn new(row: &Row, input_headers: &[&str], profile: &ScoringProfile) -> Self {
        let mut tokenized = IndexMap::new();
        for &header in input_headers {
            let cell = row.get(header).map(String::as_str).unwrap_or("");
            tokenized.insert(header.to_string(), tokenize(cell, profile));
        }
        Self {
            tokenized,
            group_tokens: IndexMap::new(),
            weights: HashMap::new(),
            heap: BinaryHeap::new(),
        }
    }

    /// The token list produced for one header.
    pub fn tokenized_cell(&self, header: &str) -> &[String] {
        self.tokenized
            .get(header)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends a header's tokens to a target group's list, creating the list
    /// on first use.
    pub fn push_group_tokens(&mut self, group_name: &str, tokens: &[String]) {
        self.group_tokens
            .entry(group_name.to_string())
            .or_default()
            .extend_from_slice(tokens);
    }

    /// Takes ownership of the per-group token lists, leaving the analyzer's
    /// routing state empty.
    pub fn take_group_tokens(&mut self) -> IndexMap<String, Vec<String>> {
        std::mem::take(&mut self.group_tokens)
    }

    /// Adds `delta` to a candidate's accumulated weight.
    pub fn increase(&mut self, index: usize, delta: f64) {
        let weight = self
            .weights
            .entry(index)
            .and_modify(|w| *w += delta)
            .or_insert(delta);
        self.heap.push(CandidateEntry {
            weight: *weight,
            index,
        });
    }

    /// Number of live candidates.
    pub fn candidate_count(&self) -> usize {
        self.weights.len()
    }

    /// Empties the accumulator, yielding `(row index, weight)` in strictly
    /// descending weight order.
    pub fn drain_sorted(&mut self) -> Vec<(usize, f64)> {
        let mut sorted = Vec::with_capacity(self.weights.len());
        while let Some(entry) = self.heap.pop() {
            // Stale entries carry an outdated weight for their index; the
            // candidate map holds the truth.
            match self.weights.get(&entry.index) {
                Some(current) if current.to_bits() == entry.weight.to_bits() => {
                    self.weights.remove(&entry.index);
                    sorted.push((entry.index, entry.weight));
                }
                _ => {}
            }
        }
        sorted
    }
}

//! A named bundle of headers with softmax-normalized weights.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// One group of a backbone side.
///
/// Weights are stored post-softmax: each configured raw weight `w_i` is
/// replaced by `exp(w_i) / Σ exp(w_j)` at construction, so the stored values
/// always sum to 1. Headers keep configuration order; a header repeated
/// within one group keeps the last configured weight.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBlock {
    name: String,
    header_weights: IndexMap<String, f64>,
    block_size: usize,
}

impl GroupBlock {
    /// Builds a group from parallel header/raw-weight lists and applies the
    /// softmax transform.
    ///
    /// # Errors
    ///
    /// `InvalidGroup` when the header list is empty, the lists differ in
    /// length, or the raw weights do not sum to a strictly positive value.
    pub fn new(name: &str, headers: &[String], raw_weights: &[f64]) -> Result<Self> {
        if headers.is_empty() {
            return Err(Error::InvalidGroup {
                group: name.to_string(),
                reason: "no headers".to_string(),
            });
        }
        if headers.len() != raw_weights.len() {
            return Err(Error::InvalidGroup {
                group: name.to_string(),
                reason: format!(
                    "{} headers but {} weights",
                    headers.len(),
                    raw_weights.len()
                ),
            });
        }
        if raw_weights.iter().sum::<f64>() <= 0.0 {
            return Err(Error::InvalidGroup {
                group: name.to_string(),
                reason: "raw weights must sum to a strictly positive value".to_string(),
            });
        }

        let mut header_weights: IndexMap<String, f64> = IndexMap::new();
        for (header, &weight) in headers.iter().zip(raw_weights) {
            header_weights.insert(header.clone(), weight);
        }
        softmax(&mut header_weights);

        let block_size = header_weights.len();
        Ok(Self {
            name: name.to_string(),
            header_weights,
            block_size,
        })
    }

    /// Rebuilds a group from already-normalized weights, bypassing the
    /// softmax. Used when reconstructing a backbone from a snapshot; applying
    /// softmax twice would change every score.
    pub(crate) fn from_normalized(name: String, headers: Vec<String>, weights: Vec<f64>) -> Self {
        let header_weights: IndexMap<String, f64> =
            headers.into_iter().zip(weights).collect();
        let block_size = header_weights.len();
        Self {
            name,
            header_weights,
            block_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Headers in configuration order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.header_weights.keys().map(String::as_str)
    }

    /// Softmax-normalized weight of a header, if the group contains it.
    pub fn weight_of(&self, header: &str) -> Option<f64> {
        self.header_weights.get(header).copied()
    }

    /// Number of distinct headers in the group.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// (header, weight) pairs in configuration order.
    pub fn header_weights(&self) -> impl Iterator<Item = (&str, f64)> {
        self.header_weights.iter().map(|(h, &w)| (h.as_str(), w))
    }
}

/// Replaces each weight `w` with `exp(w) / Σ exp(w_i)` in place.
fn softmax(weights: &mut IndexMap<String, f64>) {
    let sum_exp: f64 = weights.values().map(|w| w.exp()).sum();
    for weight in weights.values_mut() {
        *weight = weight.exp() / sum_exp;
    }
}

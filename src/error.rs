//! Error types for the linkage engine.
//!
//! Library code returns the explicit [`Error`] enum; the binary decides which
//! variants are fatal. The variants map one-to-one onto the failure classes
//! the engine can actually hit: configuration, input data, group construction,
//! tokenizer/comparator contract violations, and snapshot I/O.

use thiserror::Error;

/// Errors for fuzzy linkage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing, malformed, or references unknown names.
    #[error("configuration error: {0}")]
    Config(String),

    /// A data table cannot be read or lacks a required column.
    #[error("input error: {0}")]
    Input(String),

    /// A group block violates its construction invariants.
    #[error("invalid group '{group}': {reason}")]
    InvalidGroup { group: String, reason: String },

    /// A tokenize or compare call received input outside its contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Engine snapshot save/load failed or the format version does not match.
    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, Error>;

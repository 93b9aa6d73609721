//! Fuzzylink - Weighted Fuzzy Record Linkage
//!
//! Links the rows of a messy query table to the rows of a clean reference
//! table. The reference table is tokenized into a weighted inverted index
//! routed through a configurable bipartite "backbone" of column groups; each
//! query row is tokenized the same way and scored against the index, and a
//! collision pass nudges query rows that fight over one reference row onto
//! their runners-up.
//!
//! # Overview
//!
//! This library provides:
//! - **Configurable routing**: named column groups with softmax weights and
//!   cross-side group links, read from a YAML file
//! - **Token index**: sentinel, substring-cut, and n-gram tokens with
//!   per-posting weights, merged additively per reference row
//! - **Exact-key fast path**: key-column hits bypass fuzzy scoring entirely
//! - **Similarity coefficients**: Damerau, Jaccard, and a weighted blend for
//!   every emitted match
//! - **Collision rearrangement**: edit-distance tiebreaks with a
//!   configurable promotion threshold
//! - **Persistence**: versioned binary snapshots that round-trip
//!   byte-identically
//!
//! # Quick Start
//!
//! ```no_run
//! use fuzzylink::run_matching;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let summary = run_matching("configuration.yaml").await?;
//!     println!(
//!         "{} rows matched, results in {}",
//!         summary.processed, summary.results_path
//!     );
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! An engine is read-only after [`FuzzyDatabase::load_reference`]: lookups
//! own all of their scratch state, so `&FuzzyDatabase` can score query rows
//! from several tasks at once. The bundled orchestrator keeps everything
//! single-threaded.

pub mod backbone;
pub mod config;
pub mod error;
pub mod index;
pub mod matching;
pub mod orchestrator;
pub mod persistence;
pub mod profile;
pub mod table;
pub mod tokenizer;
pub mod utils;

#[cfg(test)]
pub mod unit_tests;

pub use backbone::{Backbone, Side};
pub use config::{load_config, parse_config, FuzzyDatabaseConfig};
pub use error::{Error, Result};
pub use matching::engine::{EngineInfo, FuzzyDatabase};
pub use matching::rearranger::rearrange_collisions;
pub use matching::results::{MatchCandidate, MatchStatus, ResultTuple};
pub use orchestrator::{FullLookup, MatchingSummary};
pub use persistence::{load_engine, save_engine};
pub use profile::ScoringProfile;
pub use table::Dataframe;

/// Builds an engine from a configuration file without running any queries.
///
/// Loads the configuration, reads the reference table, applies the
/// configured regex pre-cleaning, and ingests the table into a fresh engine.
/// Use [`persistence::save_engine`] to keep the result.
///
/// # Errors
///
/// Propagates configuration, table, and ingestion errors unchanged.
pub async fn build_engine(config_path: &str) -> Result<FuzzyDatabase> {
    let config = load_config(config_path).await?;
    let mut reference_data = Dataframe::from_csv_path(&config.data.reference_table).await?;
    reference_data.pre_process_regex(&config.regex_preprocessing)?;

    let backbone = Backbone::from_config(&config.backbone)?;
    let mut engine = FuzzyDatabase::new("FullQueryDB", backbone);
    engine.load_reference(reference_data)?;
    Ok(engine)
}

/// Runs a complete matching batch from a configuration file.
///
/// This is the programmatic equivalent of the CLI: build the engine, persist
/// its snapshot, score every query row, rearrange collisions, and write the
/// result CSV into the operating directory.
#[must_use = "the summary reports where results were written"]
pub async fn run_matching(config_path: &str) -> Result<MatchingSummary> {
    let config = load_config(config_path).await?;
    FullLookup::new(config).run().await
}

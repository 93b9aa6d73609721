//! Drives a full matching batch from one configuration file.
//!
//! Flow: load both tables, apply regex pre-cleaning, build the engine from
//! the reference table, persist its snapshot, look up every query row,
//! rearrange rank collisions across the batch, and write the result CSV into
//! the operating directory.

use bytes::Bytes;
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::backbone::Backbone;
use crate::config::FuzzyDatabaseConfig;
use crate::error::{Error, Result};
use crate::matching::engine::FuzzyDatabase;
use crate::matching::rearranger::rearrange_collisions;
use crate::matching::results::{MatchStatus, ResultTuple, ABSENT};
use crate::persistence::{save_engine, ENGINE_FILE_NAME};
use crate::table::Dataframe;
use crate::utils::file_io;

/// Result CSV file name inside the operating directory.
pub const RESULTS_FILE_NAME: &str = "results.csv";

/// Outcome counters for one batch run.
#[derive(Debug, Clone)]
pub struct MatchingSummary {
    /// Query rows processed.
    pub processed: usize,
    /// Rows resolved through the exact-key fast path.
    pub exact_key_matches: usize,
    /// Rows that produced no candidate at all.
    pub unmatched: usize,
    /// Tuples frozen by the collision rearranger.
    pub verified_collisions: usize,
    /// Where the result CSV was written.
    pub results_path: String,
    /// Where the engine snapshot was written.
    pub engine_path: String,
}

/// One full reference-against-messy matching run.
pub struct FullLookup {
    config: FuzzyDatabaseConfig,
}

impl FullLookup {
    pub fn new(config: FuzzyDatabaseConfig) -> Self {
        Self { config }
    }

    /// Runs the batch end to end and returns the outcome counters.
    pub async fn run(&self) -> Result<MatchingSummary> {
        let config = &self.config;

        let mut reference_data = Dataframe::from_csv_path(&config.data.reference_table).await?;
        let mut query_data = Dataframe::from_csv_path(&config.data.messy_table).await?;
        info!(
            "loaded {} reference rows and {} query rows",
            reference_data.len(),
            query_data.len()
        );

        log_capture_counts(
            "reference",
            &reference_data.pre_process_regex(&config.regex_preprocessing)?,
        );
        log_capture_counts(
            "query",
            &query_data.pre_process_regex(&config.regex_preprocessing)?,
        );

        let backbone = Backbone::from_config(&config.backbone)?;
        let mut engine = FuzzyDatabase::new("FullQueryDB", backbone);
        engine.load_reference(reference_data)?;

        let engine_path = operating_path(&config.operating_dir, ENGINE_FILE_NAME);
        save_engine(&engine, &engine_path).await?;
        info!("engine snapshot written to {engine_path}");

        let mut tuples = self.look_up_batch(&engine, &query_data)?;

        rearrange_collisions(&query_data, &mut tuples, config.collision_diff_percent);

        let results_path = operating_path(&config.operating_dir, RESULTS_FILE_NAME);
        write_results(&tuples, &results_path).await?;
        info!("results written to {results_path}");

        Ok(MatchingSummary {
            processed: tuples.len(),
            exact_key_matches: tuples.iter().filter(|t| t.top_weight == f64::MAX).count(),
            unmatched: tuples.iter().filter(|t| t.top_idx == ABSENT).count(),
            verified_collisions: tuples
                .iter()
                .filter(|t| t.status == MatchStatus::Verified)
                .count(),
            results_path,
            engine_path,
        })
    }

    /// Scores every query row and assembles one result tuple per row.
    fn look_up_batch(
        &self,
        engine: &FuzzyDatabase,
        query_data: &Dataframe,
    ) -> Result<Vec<ResultTuple>> {
        let comparator = engine.comparator();
        let progress = ProgressBar::new(query_data.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("  [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} Matching query rows...")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );

        let mut tuples = Vec::with_capacity(query_data.len());
        for (query_idx, query_row) in query_data.iter().enumerate() {
            let matches = engine.look_up(query_row)?;
            let tuple = match matches.first() {
                None => {
                    warn!("query row {query_idx} produced no candidates");
                    ResultTuple::unmatched(query_idx as i64)
                }
                Some(top) => {
                    let second = matches.get(1);
                    ResultTuple {
                        query_idx: query_idx as i64,
                        top_idx: top.index as i64,
                        top_weight: top.weight,
                        second_idx: second.map(|c| c.index as i64).unwrap_or(ABSENT),
                        second_weight: second.map(|c| c.weight).unwrap_or(0.0),
                        damerau_sim: comparator.damerau(query_row, &top.row),
                        jaccard_sim: comparator.jaccard(query_row, &top.row),
                        same_id: engine.compare_by_id(&top.row, query_row),
                        status: MatchStatus::Open,
                    }
                }
            };
            tuples.push(tuple);
            progress.inc(1);
        }
        progress.finish_and_clear();
        Ok(tuples)
    }
}

/// Serializes result tuples to the emitted CSV shape:
/// `query,match,secondMatch,coefficientDamerau,coefficientJaccard,idMatch`.
pub async fn write_results(tuples: &[ResultTuple], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "query",
            "match",
            "secondMatch",
            "coefficientDamerau",
            "coefficientJaccard",
            "idMatch",
        ])
        .map_err(|e| Error::Input(format!("cannot write result header: {e}")))?;

    for tuple in tuples {
        writer
            .write_record([
                tuple.query_idx.to_string(),
                tuple.top_idx.to_string(),
                tuple.second_idx.to_string(),
                format!("{:.3}", tuple.damerau_sim),
                format!("{:.3}", tuple.jaccard_sim),
                if tuple.same_id { "1" } else { "0" }.to_string(),
            ])
            .map_err(|e| Error::Input(format!("cannot write result record: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Input(format!("cannot flush result CSV: {e}")))?;
    file_io::write_bytes(path, Bytes::from(bytes))
        .await
        .map_err(|e| Error::Input(format!("cannot write results '{path}': {e}")))
}

/// Joins a file name onto the operating directory, tolerating URI-style
/// directories.
fn operating_path(operating_dir: &str, file_name: &str) -> String {
    format!("{}/{}", operating_dir.trim_end_matches('/'), file_name)
}

fn log_capture_counts(side: &str, counts: &IndexMap<String, usize>) {
    for (column, count) in counts {
        info!("regex pre-processing [{side}] {column}: {count} cells rewritten");
    }
}

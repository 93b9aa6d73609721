//! The matching engine: index build, exact-key fast path, and fuzzy scoring.

use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::backbone::{Backbone, Side};
use crate::error::{Error, Result};
use crate::index::{Pool, Posting};
use crate::matching::analyzer::QueryAnalyzer;
use crate::matching::results::MatchCandidate;
use crate::matching::similarity::SimilarityComparator;
use crate::profile::ScoringProfile;
use crate::table::{Dataframe, Row, INDEX_COLUMN};
use crate::tokenizer::tokenize;

/// Summary statistics about a built engine.
///
/// # Examples
///
/// ```no_run
/// # use fuzzylink::FuzzyDatabase;
/// # let engine: FuzzyDatabase = todo!();
/// let info = engine.info();
/// println!(
///     "'{}' indexes {} rows as {} tokens",
///     info.name, info.reference_rows, info.distinct_tokens
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub name: String,
    /// Rows in the ingested reference table.
    pub reference_rows: usize,
    pub reference_groups: usize,
    pub target_groups: usize,
    /// Reference groups that saw at least one token.
    pub pools: usize,
    /// Distinct tokens across all pools.
    pub distinct_tokens: usize,
    /// Total postings across all buckets.
    pub postings: usize,
}

/// A tokenized, weighted, group-routed index over one reference table.
///
/// Build once with [`load_reference`](Self::load_reference), query any number
/// of times with [`look_up`](Self::look_up). After the build the backbone and
/// the pools are never mutated; every lookup works on scratch state it owns,
/// so shared references to the engine can score query rows concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyDatabase {
    name: String,
    backbone: Backbone,
    pools: IndexMap<String, Pool>,
    source: Dataframe,
    profile: ScoringProfile,
}

impl FuzzyDatabase {
    /// Creates an empty engine around a backbone, with the default scoring
    /// profile.
    pub fn new(name: &str, backbone: Backbone) -> Self {
        Self::with_profile(name, backbone, ScoringProfile::default())
    }

    /// Creates an empty engine with an explicit scoring profile.
    pub fn with_profile(name: &str, backbone: Backbone, profile: ScoringProfile) -> Self {
        Self {
            name: name.to_string(),
            backbone,
            pools: IndexMap::new(),
            source: Dataframe::new(),
            profile,
        }
    }

    /// Ingests the reference table: tokenizes every cell under every
    /// reference input header and files weighted postings into the pools of
    /// the groups containing that header.
    ///
    /// The same token arriving from two headers of one group merges into one
    /// posting with the weights added.
    ///
    /// # Errors
    ///
    /// `Input` when a row lacks a parseable `index` column.
    pub fn load_reference(&mut self, table: Dataframe) -> Result<()> {
        info!("loading {} reference rows into '{}'", table.len(), self.name);

        let progress = ProgressBar::new(table.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("  [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} Indexing reference rows...")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );

        let input_headers: Vec<String> = self
            .backbone
            .input_headers(Side::Reference)
            .into_iter()
            .map(str::to_string)
            .collect();

        for row in &table {
            let row_index = parse_row_index(row)?;

            for header in &input_headers {
                let cell = row.get(header).map(String::as_str).unwrap_or("");
                let tokens = tokenize(cell, &self.profile);
                if tokens.is_empty() {
                    continue;
                }

                for block in self.backbone.groups_from_header(header, Side::Reference) {
                    let weight = match block.weight_of(header) {
                        Some(weight) => weight,
                        None => continue,
                    };
                    let group_name = block.name().to_string();
                    let pool = self.pools.entry(group_name).or_default();
                    for token in &tokens {
                        pool.place(
                            token,
                            Posting {
                                index: row_index,
                                weight,
                            },
                        );
                    }
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        let token_total: usize = self.pools.values().map(Pool::len).sum();
        info!(
            "indexed {} rows into {} pools holding {} distinct tokens",
            table.len(),
            self.pools.len(),
            token_total
        );

        self.source = table;
        Ok(())
    }

    /// Exact lookup of a key value in the pools of the reference groups
    /// containing the reference key header. Returns distinct row indices in
    /// posting order.
    pub fn look_up_by_key(&self, key: &str) -> Vec<usize> {
        let Some(key_header) = self.backbone.reference_key_header() else {
            return Vec::new();
        };

        let mut indices: Vec<usize> = Vec::new();
        for block in self.backbone.groups_from_header(key_header, Side::Reference) {
            let Some(pool) = self.pools.get(block.name()) else {
                continue;
            };
            let Some(bucket) = pool.get(key) else {
                continue;
            };
            for posting in bucket.entries() {
                if !indices.contains(&posting.index) {
                    indices.push(posting.index);
                }
            }
        }
        indices
    }

    /// Performs a lookup for one query row and returns candidates in
    /// descending weight order.
    ///
    /// When the query carries a non-empty value under the target key header
    /// and that key hits the reference index exactly, the key matches are
    /// returned immediately with the `f64::MAX` weight sentinel - ranking by
    /// key is total, not score-based. Otherwise the fuzzy pipeline runs:
    /// tokenize the query cells, route token lists into the target groups,
    /// walk each target group's linked reference pools, and accumulate
    /// `posting_weight · length_weight · bucket_filter` per candidate.
    pub fn look_up(&self, row: &Row) -> Result<Vec<MatchCandidate>> {
        if let Some(key_header) = self.backbone.target_key_header() {
            if let Some(key) = row.get(key_header) {
                if !key.is_empty() {
                    let key_matches = self.look_up_by_key(key);
                    if !key_matches.is_empty() {
                        debug!("exact key hit for '{key}': {} rows", key_matches.len());
                        return Ok(self.assemble_key_matches(&key_matches));
                    }
                }
            }
        }

        let input_headers = self.backbone.input_headers(Side::Target);
        let mut analyzer = QueryAnalyzer::new(row, &input_headers, &self.profile);

        for &header in &input_headers {
            let tokens = analyzer.tokenized_cell(header).to_vec();
            if tokens.is_empty() {
                continue;
            }
            for block in self.backbone.groups_from_header(header, Side::Target) {
                analyzer.push_group_tokens(block.name(), &tokens);
            }
        }

        let group_tokens = analyzer.take_group_tokens();
        for group_name in self.backbone.groups(Side::Target).keys() {
            let Some(tokens) = group_tokens.get(group_name) else {
                continue;
            };
            for reference_block in self.backbone.links_from(group_name, false) {
                let Some(pool) = self.pools.get(reference_block.name()) else {
                    continue;
                };
                for token in tokens {
                    let Some(bucket) = pool.get(token) else {
                        continue;
                    };
                    let length_weight = self.profile.length_weight(token.chars().count());
                    let bucket_filter = self.profile.bucket_filter(bucket.size());
                    for posting in bucket.entries() {
                        let contribution = posting.weight * length_weight * bucket_filter;
                        if contribution > 0.0 {
                            analyzer.increase(posting.index, contribution);
                        }
                    }
                }
            }
        }

        let mut matches = Vec::with_capacity(analyzer.candidate_count());
        for (index, weight) in analyzer.drain_sorted() {
            let Some(source_row) = self.source.get(index) else {
                continue;
            };
            let mut annotated = source_row.clone();
            annotated.insert("weight".to_string(), format!("{weight:.3}"));
            matches.push(MatchCandidate {
                index,
                weight,
                row: annotated,
            });
        }
        Ok(matches)
    }

    /// Whether the reference row's key column and the target row's key
    /// column hold the same value (case-insensitive). False when either key
    /// column is unconfigured or missing from its row.
    pub fn compare_by_id(&self, reference: &Row, target: &Row) -> bool {
        let (Some(ref_header), Some(tgt_header)) = (
            self.backbone.reference_key_header(),
            self.backbone.target_key_header(),
        ) else {
            return false;
        };
        match (reference.get(ref_header), target.get(tgt_header)) {
            (Some(reference_id), Some(target_id)) => {
                reference_id.eq_ignore_ascii_case(target_id)
            }
            _ => false,
        }
    }

    /// A similarity comparator bound to this engine's backbone.
    pub fn comparator(&self) -> SimilarityComparator<'_> {
        SimilarityComparator::new(&self.backbone)
    }

    /// Summary statistics for diagnostics and CLI output.
    pub fn info(&self) -> EngineInfo {
        let distinct_tokens = self.pools.values().map(Pool::len).sum();
        let postings = self
            .pools
            .values()
            .flat_map(Pool::iter)
            .map(|(_, bucket)| bucket.entries().len())
            .sum();
        EngineInfo {
            name: self.name.clone(),
            reference_rows: self.source.len(),
            reference_groups: self.backbone.groups(Side::Reference).len(),
            target_groups: self.backbone.groups(Side::Target).len(),
            pools: self.pools.len(),
            distinct_tokens,
            postings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backbone(&self) -> &Backbone {
        &self.backbone
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    /// The ingested reference table.
    pub fn source(&self) -> &Dataframe {
        &self.source
    }

    /// Pools by reference group name, for snapshots and diagnostics.
    pub(crate) fn pools(&self) -> &IndexMap<String, Pool> {
        &self.pools
    }

    /// Reassembles an engine from snapshot parts.
    pub(crate) fn from_parts(
        name: String,
        backbone: Backbone,
        pools: IndexMap<String, Pool>,
        source: Dataframe,
        profile: ScoringProfile,
    ) -> Self {
        Self {
            name,
            backbone,
            pools,
            source,
            profile,
        }
    }

    fn assemble_key_matches(&self, indices: &[usize]) -> Vec<MatchCandidate> {
        let mut rows = self.source.subset(indices);
        indices
            .iter()
            .zip(rows.iter_mut())
            .map(|(&index, row)| {
                row.insert("weight".to_string(), format!("{:e}", f64::MAX));
                MatchCandidate {
                    index,
                    weight: f64::MAX,
                    row: row.clone(),
                }
            })
            .collect()
    }
}

/// Parses a row's synthetic `index` column.
fn parse_row_index(row: &Row) -> Result<usize> {
    let raw = row
        .get(INDEX_COLUMN)
        .ok_or_else(|| Error::Input(format!("row is missing the '{INDEX_COLUMN}' column")))?;
    raw.parse::<usize>()
        .map_err(|e| Error::Input(format!("row index '{raw}' is not an ordinal: {e}")))
}

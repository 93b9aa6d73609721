//! The backbone: configuration-defined bipartite routing between reference
//! groups and target groups.
//!
//! Each side is an ordered arena of [`GroupBlock`]s indexed by group name.
//! Cross-side links are stored as name lists and resolved to blocks at
//! lookup time, so there is no pointer graph to keep consistent and the
//! whole structure is read-only once built. Header inversions
//! (`header → groups containing it`) are precomputed because both the index
//! build and the query path route through them on every cell.

pub mod group_block;

use indexmap::IndexMap;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

use crate::config::BackboneConfig;
use crate::error::{Error, Result};
pub use group_block::GroupBlock;

/// Which side of the bipartite structure a call refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Reference,
    Target,
}

/// Grammar of one group entry: `Header(weight)` with a non-negative decimal
/// weight. The first match inside the entry wins; entries with no match are
/// skipped.
static GROUP_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S+)\((\d+(?:\.\d+)?)\)").expect("valid literal regex"));

/// The bipartite routing structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Backbone {
    ref_groups: IndexMap<String, GroupBlock>,
    tgt_groups: IndexMap<String, GroupBlock>,
    ref_by_header: IndexMap<String, SmallVec<[String; 2]>>,
    tgt_by_header: IndexMap<String, SmallVec<[String; 2]>>,
    ref_to_tgt: IndexMap<String, Vec<String>>,
    tgt_to_ref: IndexMap<String, Vec<String>>,
    reference_key_header: Option<String>,
    target_key_header: Option<String>,
}

impl Backbone {
    /// Builds the backbone from a parsed `BackboneConfiguration` section.
    ///
    /// Group entries are parsed with the `Header(weight)` grammar and each
    /// group gets softmax-normalized weights. Link values are normalized to
    /// lists; link names that do not resolve to a group on the opposite side
    /// are dropped from routing with a warning, which permits asymmetric
    /// configurations.
    ///
    /// # Errors
    ///
    /// `Config` when a group has no parseable entry; `InvalidGroup` when a
    /// group violates its construction invariants.
    pub fn from_config(config: &BackboneConfig) -> Result<Self> {
        let ref_groups = parse_groups(&config.reference_groups)?;
        let tgt_groups = parse_groups(&config.target_groups)?;

        let ref_by_header = invert_headers(&ref_groups);
        let tgt_by_header = invert_headers(&tgt_groups);

        let ref_to_tgt = resolve_links("ref_to_tgt", &config.ref_to_tgt, &tgt_groups);
        let tgt_to_ref = resolve_links("tgt_to_ref", &config.tgt_to_ref, &ref_groups);

        Ok(Self {
            ref_groups,
            tgt_groups,
            ref_by_header,
            tgt_by_header,
            ref_to_tgt,
            tgt_to_ref,
            reference_key_header: config.reference_key_col.clone(),
            target_key_header: config.target_key_col.clone(),
        })
    }

    /// Every header that appears in any group on the given side, in first-use
    /// order.
    pub fn input_headers(&self, side: Side) -> Vec<&str> {
        self.by_header(side).keys().map(String::as_str).collect()
    }

    /// All groups on a side that include the given header.
    pub fn groups_from_header(&self, header: &str, side: Side) -> Vec<&GroupBlock> {
        let groups = self.groups(side);
        self.by_header(side)
            .get(header)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| groups.get(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The full group-name → block map for a side, in configuration order.
    pub fn groups(&self, side: Side) -> &IndexMap<String, GroupBlock> {
        match side {
            Side::Reference => &self.ref_groups,
            Side::Target => &self.tgt_groups,
        }
    }

    /// Resolves the groups linked from `group_name`.
    ///
    /// `left_to_right = true` follows `ref_to_tgt`; `false` follows
    /// `tgt_to_ref`. Names are resolved against the opposite side's arena at
    /// call time.
    pub fn links_from(&self, group_name: &str, left_to_right: bool) -> Vec<&GroupBlock> {
        let (links, end_groups) = if left_to_right {
            (&self.ref_to_tgt, &self.tgt_groups)
        } else {
            (&self.tgt_to_ref, &self.ref_groups)
        };
        links
            .get(group_name)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| end_groups.get(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Designated key column on the reference side, if configured.
    pub fn reference_key_header(&self) -> Option<&str> {
        self.reference_key_header.as_deref()
    }

    /// Designated key column on the query side, if configured.
    pub fn target_key_header(&self) -> Option<&str> {
        self.target_key_header.as_deref()
    }

    fn by_header(&self, side: Side) -> &IndexMap<String, SmallVec<[String; 2]>> {
        match side {
            Side::Reference => &self.ref_by_header,
            Side::Target => &self.tgt_by_header,
        }
    }

    /// Raw link name lists, used for snapshots.
    pub(crate) fn links(&self, left_to_right: bool) -> &IndexMap<String, Vec<String>> {
        if left_to_right {
            &self.ref_to_tgt
        } else {
            &self.tgt_to_ref
        }
    }

    /// Reassembles a backbone from snapshot parts. Weights arrive already
    /// normalized; header inversions are derived rather than stored.
    pub(crate) fn from_parts(
        ref_groups: IndexMap<String, GroupBlock>,
        tgt_groups: IndexMap<String, GroupBlock>,
        ref_to_tgt: IndexMap<String, Vec<String>>,
        tgt_to_ref: IndexMap<String, Vec<String>>,
        reference_key_header: Option<String>,
        target_key_header: Option<String>,
    ) -> Self {
        let ref_by_header = invert_headers(&ref_groups);
        let tgt_by_header = invert_headers(&tgt_groups);
        Self {
            ref_groups,
            tgt_groups,
            ref_by_header,
            tgt_by_header,
            ref_to_tgt,
            tgt_to_ref,
            reference_key_header,
            target_key_header,
        }
    }
}

/// Parses every group of one side with the `Header(weight)` grammar.
fn parse_groups(raw: &IndexMap<String, Vec<String>>) -> Result<IndexMap<String, GroupBlock>> {
    let mut groups = IndexMap::new();
    for (group_name, entries) in raw {
        let mut headers: Vec<String> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        for entry in entries {
            if let Some(captures) = GROUP_ENTRY.captures(entry.trim()) {
                headers.push(captures[1].to_string());
                let weight: f64 = captures[2]
                    .parse()
                    .map_err(|e| Error::Config(format!(
                        "group '{group_name}': malformed weight in '{entry}': {e}"
                    )))?;
                weights.push(weight);
            }
        }
        if headers.is_empty() {
            return Err(Error::Config(format!(
                "group '{group_name}' has no valid 'Header(weight)' entries"
            )));
        }
        let block = GroupBlock::new(group_name, &headers, &weights)?;
        groups.insert(group_name.clone(), block);
    }
    Ok(groups)
}

/// Builds the header → group-name inversion for one side.
fn invert_headers(
    groups: &IndexMap<String, GroupBlock>,
) -> IndexMap<String, SmallVec<[String; 2]>> {
    let mut by_header: IndexMap<String, SmallVec<[String; 2]>> = IndexMap::new();
    for (name, block) in groups {
        for header in block.headers() {
            by_header
                .entry(header.to_string())
                .or_default()
                .push(name.clone());
        }
    }
    by_header
}

/// Normalizes link values to lists and drops names with no group on the
/// opposite side.
fn resolve_links(
    direction: &str,
    raw: &IndexMap<String, crate::config::LinkTargets>,
    end_groups: &IndexMap<String, GroupBlock>,
) -> IndexMap<String, Vec<String>> {
    let mut links = IndexMap::new();
    for (source, targets) in raw {
        let mut resolved = Vec::new();
        for name in targets.as_list() {
            if end_groups.contains_key(&name) {
                resolved.push(name);
            } else {
                warn!("{direction}: link {source} -> {name} names an unknown group, dropped");
            }
        }
        links.insert(source.clone(), resolved);
    }
    links
}

// Link to test module (only compiled during tests)
#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;

//! Typed view of the YAML configuration file.
//!
//! The key spelling mirrors the configuration format consumed by the engine's
//! operators, so existing configuration files load unchanged:
//!
//! ```yaml
//! FuzzyDatabaseConfig:
//!   BackboneConfiguration:
//!     reference_groups:
//!       ID: ["Customer_ID(1)"]
//!       Name: ["Customer_Name(6)", "Industrial_Sector(2)"]
//!     target_groups:
//!       ID: ["Customer_ID(5)", "Customer_Name(1)"]
//!       Name: ["Customer_Name(4)", "Customer_ID(1)"]
//!     ref_to_tgt: { ID: ID, Name: Name }
//!     tgt_to_ref: { ID: ID, Name: [Name, ID] }
//!     reference_key_col: "Customer_ID"
//!     target_key_col: "Customer_ID"
//!   DataToConsume:
//!     ReferenceTable: "reference.csv"
//!     MessyTable: "messy.csv"
//!   OperatingDir: "out"
//!   RegexPreprocessing:
//!     Customer_ID: "(\\d+)"
//! ```
//!
//! Group entries use the `Header(weight)` grammar; link values accept either
//! a single group name or a list. All maps preserve YAML order, which fixes
//! group iteration order everywhere downstream.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::utils::file_io;

/// Top-level wrapper matching the single `FuzzyDatabaseConfig` document key.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigRoot {
    #[serde(rename = "FuzzyDatabaseConfig")]
    pub fuzzy_database_config: FuzzyDatabaseConfig,
}

/// Everything the orchestrator needs to run one matching batch.
#[derive(Debug, Clone, Deserialize)]
pub struct FuzzyDatabaseConfig {
    #[serde(rename = "BackboneConfiguration")]
    pub backbone: BackboneConfig,

    #[serde(rename = "DataToConsume")]
    pub data: DataToConsume,

    /// Directory receiving the result CSV and the persisted engine.
    #[serde(rename = "OperatingDir")]
    pub operating_dir: String,

    /// Header → regex with at least one capture group, applied to cells
    /// before tokenization.
    #[serde(rename = "RegexPreprocessing", default)]
    pub regex_preprocessing: IndexMap<String, String>,

    /// Promotion threshold for the collision rearranger.
    #[serde(rename = "CollisionDiffPercent", default = "default_collision_diff_percent")]
    pub collision_diff_percent: f64,
}

fn default_collision_diff_percent() -> f64 {
    0.05
}

/// Paths of the two input tables.
#[derive(Debug, Clone, Deserialize)]
pub struct DataToConsume {
    #[serde(rename = "ReferenceTable")]
    pub reference_table: String,

    #[serde(rename = "MessyTable")]
    pub messy_table: String,
}

/// The `BackboneConfiguration` section: groups, links, and key columns.
#[derive(Debug, Clone, Deserialize)]
pub struct BackboneConfig {
    pub reference_groups: IndexMap<String, Vec<String>>,
    pub target_groups: IndexMap<String, Vec<String>>,

    #[serde(default)]
    pub ref_to_tgt: IndexMap<String, LinkTargets>,

    #[serde(default)]
    pub tgt_to_ref: IndexMap<String, LinkTargets>,

    /// Key column on the reference side; absent disables the exact-key fast
    /// path.
    #[serde(default)]
    pub reference_key_col: Option<String>,

    /// Key column on the query side.
    #[serde(default)]
    pub target_key_col: Option<String>,
}

/// A link value: one group name or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LinkTargets {
    One(String),
    Many(Vec<String>),
}

impl LinkTargets {
    /// Normalizes to a list, as all link consumers expect.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            LinkTargets::One(name) => vec![name.clone()],
            LinkTargets::Many(names) => names.clone(),
        }
    }
}

/// Parses a configuration document from YAML text.
pub fn parse_config(yaml: &str) -> Result<FuzzyDatabaseConfig> {
    let root: ConfigRoot = serde_yaml::from_str(yaml)
        .map_err(|e| Error::Config(format!("invalid configuration YAML: {e}")))?;
    Ok(root.fuzzy_database_config)
}

/// Loads and parses a configuration file from a local path, `s3://` URI, or
/// `memory://` test path.
pub async fn load_config(path: &str) -> Result<FuzzyDatabaseConfig> {
    let bytes = file_io::read_bytes(path)
        .await
        .map_err(|e| Error::Config(format!("cannot read configuration '{path}': {e}")))?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| Error::Config(format!("configuration '{path}' is not UTF-8: {e}")))?;
    parse_config(text)
}

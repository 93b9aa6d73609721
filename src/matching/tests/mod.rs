// Test module organization for the matching engine
// This module is only compiled during testing via #[cfg(test)] in matching/mod.rs

use crate::backbone::Backbone;
use crate::config::parse_config;
use crate::matching::engine::FuzzyDatabase;
use crate::table::{Dataframe, Row};

mod rearranger_tests;
mod scoring_tests;

pub(crate) fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The backbone from the end-to-end configuration scenario.
pub(crate) fn scenario_backbone() -> Backbone {
    let yaml = r#"
FuzzyDatabaseConfig:
  BackboneConfiguration:
    reference_groups:
      ID: ["Customer_ID(1)"]
      Name: ["Customer_Name(6)", "Industrial_Sector(2)"]
    target_groups:
      ID: ["Customer_ID(5)", "Customer_Name(1)"]
      Name: ["Customer_Name(4)", "Customer_ID(1)"]
    ref_to_tgt:
      ID: ID
      Name: Name
    tgt_to_ref:
      ID: ID
      Name: [Name, ID]
    reference_key_col: "Customer_ID"
    target_key_col: "Customer_ID"
  DataToConsume:
    ReferenceTable: "r.csv"
    MessyTable: "m.csv"
  OperatingDir: "out"
"#;
    Backbone::from_config(&parse_config(yaml).unwrap().backbone).unwrap()
}

/// Eight reference rows; row 4 carries the exact-key scenario, row 7 the
/// fuzzy-name scenario.
pub(crate) fn scenario_reference_table() -> Dataframe {
    let columns = vec![
        "Customer_ID".to_string(),
        "Customer_Name".to_string(),
        "Industrial_Sector".to_string(),
    ];
    let mk = |id: &str, name: &str, sector: &str| {
        row(&[
            ("Customer_ID", id),
            ("Customer_Name", name),
            ("Industrial_Sector", sector),
        ])
    };
    Dataframe::from_rows(
        columns,
        vec![
            mk("20001", "Orion Logistics", "Transport"),
            mk("20002", "Helix Pharma", "Healthcare"),
            mk("20003", "Quartz Mining", "Mining"),
            mk("20004", "Vertex Textiles", "Textiles"),
            mk("12345", "Foo Bar LLC", "Services"),
            mk("20005", "Summit Dairy", "Agriculture"),
            mk("20006", "Harbor Freight Lines", "Transport"),
            mk("", "Flat Ridge 4 Wind", "Energy"),
        ],
    )
}

/// Engine loaded with the scenario reference table.
pub(crate) fn scenario_engine() -> FuzzyDatabase {
    let mut engine = FuzzyDatabase::new("scenario", scenario_backbone());
    engine.load_reference(scenario_reference_table()).unwrap();
    engine
}

// Test module organization for the backbone
// This module is only compiled during testing via #[cfg(test)] in backbone/mod.rs

use crate::backbone::{Backbone, Side};
use crate::config::parse_config;
use crate::error::Error;


/// Backbone built from the end-to-end scenario configuration.
fn scenario_backbone() -> Backbone {
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
    let config = parse_config(yaml).unwrap();
    Backbone::from_config(&config.backbone).unwrap()
}

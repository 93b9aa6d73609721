//! End-to-end batch runs over in-memory files.

use bytes::Bytes;

use super::*;
use crate::utils::file_io::{read_bytes, register_memory_file};
use crate::{load_engine, run_matching};

const REFERENCE_CSV: &str = "\
Customer_ID,Customer_Name,Industrial_Sector
20001,Orion Logistics,Transport
20002,Helix Pharma,Healthcare
20003,Quartz Mining,Mining
20004,Vertex Textiles,Textiles
12345,Foo Bar LLC,Services
20005,Summit Dairy,Agriculture
20006,Harbor Freight Lines,Transport
,Flat Ridge 4 Wind,Energy
";

const MESSY_CSV: &str = "\
Customer_ID,Customer_Name
12345,
55555,Flat Ridge 4 Wind LLC
,Harbour Freight Lines
";

fn e2e_config(prefix: &str) -> String {
    format!(
        r#"
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
    ReferenceTable: "memory://{prefix}/reference.csv"
    MessyTable: "memory://{prefix}/messy.csv"
  OperatingDir: "memory://{prefix}/out"
  CollisionDiffPercent: 0.20
"#
    )
}

async fn stage_inputs(prefix: &str) {
    register_memory_file(
        &format!("memory://{prefix}/reference.csv"),
        Bytes::from_static(REFERENCE_CSV.as_bytes()),
    )
    .await
    .unwrap();
    register_memory_file(
        &format!("memory://{prefix}/messy.csv"),
        Bytes::from_static(MESSY_CSV.as_bytes()),
    )
    .await
    .unwrap();
    register_memory_file(
        &format!("memory://{prefix}/config.yaml"),
        Bytes::from(e2e_config(prefix)),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn full_batch_writes_expected_results() {
    let prefix = "e2e_batch";
    stage_inputs(prefix).await;

    let summary = run_matching(&format!("memory://{prefix}/config.yaml"))
        .await
        .unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.exact_key_matches, 1);
    assert_eq!(summary.unmatched, 0);

    let csv = read_bytes(&summary.results_path).await.unwrap();
    let text = String::from_utf8(csv.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "query,match,secondMatch,coefficientDamerau,coefficientJaccard,idMatch"
    );
    assert_eq!(lines.len(), 4);

    // Query 0 hits reference row 4 through the exact key, so the id flag is
    // set and no runner-up is reported.
    let first: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first[0], "0");
    assert_eq!(first[1], "4");
    assert_eq!(first[5], "1");

    // Query 1 has an unindexed key and resolves by name to row 7.
    let second: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(second[0], "1");
    assert_eq!(second[1], "7");
    assert_eq!(second[5], "0");

    // Query 2 misspells "Harbor" and still lands on row 6.
    let third: Vec<&str> = lines[3].split(',').collect();
    assert_eq!(third[0], "2");
    assert_eq!(third[1], "6");
}

#[tokio::test]
async fn batch_snapshot_is_loadable_and_consistent() {
    let prefix = "e2e_snapshot";
    stage_inputs(prefix).await;

    let summary = run_matching(&format!("memory://{prefix}/config.yaml"))
        .await
        .unwrap();

    let engine = load_engine(&summary.engine_path).await.unwrap();
    let matches = engine
        .look_up(&row(&[("Customer_ID", "12345")]))
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].index, 4);
}

#[tokio::test]
async fn missing_configuration_fails_with_config_error() {
    let err = run_matching("memory://e2e_missing/config.yaml")
        .await
        .unwrap_err();
    assert!(matches!(err, crate::Error::Config(_)));
}

#[tokio::test]
async fn missing_data_table_fails_with_input_error() {
    let prefix = "e2e_no_tables";
    register_memory_file(
        &format!("memory://{prefix}/config.yaml"),
        Bytes::from(e2e_config(prefix)),
    )
    .await
    .unwrap();

    let err = run_matching(&format!("memory://{prefix}/config.yaml"))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::Error::Input(_)));
}

#[test]
fn scenario_queries_match_their_rows_in_process() {
    let engine = scenario_engine();

    // Exact key scenario.
    let matches = engine.look_up(&row(&[("Customer_ID", "12345")])).unwrap();
    assert_eq!(matches[0].index, 4);
    assert_eq!(matches[0].weight, f64::MAX);

    // Fuzzy name scenario.
    let matches = engine
        .look_up(&row(&[
            ("Customer_Name", "Flat Ridge 4 Wind, LLC"),
            ("Industrial_Sector", "Manufacturing"),
        ]))
        .unwrap();
    assert_eq!(matches[0].index, 7);
    assert!(matches[0].weight > 0.0);
}

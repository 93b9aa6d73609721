use super::*;
use crate::backbone::Side;
use crate::matching::engine::FuzzyDatabase;

#[test]
fn exact_key_hit_returns_the_keyed_row_with_the_sentinel_weight() {
    let engine = scenario_engine();
    let query = row(&[("Customer_ID", "12345")]);
    let matches = engine.look_up(&query).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].index, 4);
    assert_eq!(matches[0].weight, f64::MAX);
    assert_eq!(matches[0].row["Customer_Name"], "Foo Bar LLC");
    assert_eq!(matches[0].row["matchedByID"], "1");
}

#[test]
fn exact_key_path_only_returns_rows_with_that_key() {
    let engine = scenario_engine();
    for candidate in engine.look_up(&row(&[("Customer_ID", "20003")])).unwrap() {
        assert_eq!(candidate.row["Customer_ID"], "20003");
    }
}

#[test]
fn empty_key_falls_through_to_fuzzy_scoring() {
    let engine = scenario_engine();
    let query = row(&[("Customer_ID", ""), ("Customer_Name", "Foo Bar")]);
    let matches = engine.look_up(&query).unwrap();
    assert!(!matches.is_empty());
    // Fuzzy weights, not the key sentinel.
    assert!(matches[0].weight < f64::MAX);
    assert_eq!(matches[0].index, 4);
}

#[test]
fn unindexed_key_falls_through_to_fuzzy_scoring() {
    let engine = scenario_engine();
    let query = row(&[("Customer_ID", "99999"), ("Customer_Name", "Flat Ridge 4 Wind")]);
    let matches = engine.look_up(&query).unwrap();
    assert!(!matches.is_empty());
    assert_eq!(matches[0].index, 7);
}

#[test]
fn fuzzy_name_lookup_ranks_the_real_row_first() {
    let engine = scenario_engine();
    let query = row(&[
        ("Customer_Name", "Flat Ridge 4 Wind, LLC"),
        ("Industrial_Sector", "Manufacturing"),
    ]);
    let matches = engine.look_up(&query).unwrap();
    assert!(!matches.is_empty());
    assert_eq!(matches[0].index, 7);
    assert!(matches[0].weight > 0.0);
}

#[test]
fn every_candidate_carries_positive_weight() {
    let engine = scenario_engine();
    let query = row(&[("Customer_Name", "Harbor Freight")]);
    let matches = engine.look_up(&query).unwrap();
    assert!(!matches.is_empty());
    for candidate in &matches {
        assert!(candidate.weight > 0.0, "candidate {} at zero", candidate.index);
    }
}

#[test]
fn candidates_arrive_in_strictly_descending_weight_order() {
    let engine = scenario_engine();
    let query = row(&[("Customer_Name", "Orion Logistics Transport")]);
    let matches = engine.look_up(&query).unwrap();
    for pair in matches.windows(2) {
        assert!(pair[0].weight >= pair[1].weight);
    }
}

#[test]
fn scoring_twice_yields_identical_results() {
    let engine = scenario_engine();
    let query = row(&[("Customer_Name", "Flat Ridge 4 Wind, LLC")]);
    let first = engine.look_up(&query).unwrap();
    let second = engine.look_up(&query).unwrap();
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.index, b.index);
        assert_eq!(a.weight.to_bits(), b.weight.to_bits());
    }
}

#[test]
fn query_with_no_usable_headers_returns_nothing() {
    let engine = scenario_engine();
    let matches = engine.look_up(&row(&[("Unrelated", "zzz")])).unwrap();
    assert!(matches.is_empty());
}

#[test]
fn candidate_rows_are_annotated_with_formatted_weights() {
    let engine = scenario_engine();
    let query = row(&[("Customer_Name", "Summit Dairy")]);
    let matches = engine.look_up(&query).unwrap();
    let top = &matches[0];
    assert_eq!(top.row["weight"], format!("{:.3}", top.weight));
    // The ingested table itself stays clean.
    assert!(!engine.source().get(top.index).unwrap().contains_key("weight"));
}

#[test]
fn same_token_from_two_headers_of_one_group_merges_postings() {
    let yaml = r#"
FuzzyDatabaseConfig:
  BackboneConfiguration:
    reference_groups: { Pair: ["A(1)", "B(1)"] }
    target_groups: { Pair: ["A(1)"] }
    tgt_to_ref: { Pair: Pair }
  DataToConsume:
    ReferenceTable: "r.csv"
    MessyTable: "m.csv"
  OperatingDir: "out"
"#;
    let backbone = Backbone::from_config(
        &crate::config::parse_config(yaml).unwrap().backbone,
    )
    .unwrap();
    let mut engine = FuzzyDatabase::new("merge", backbone);
    engine
        .load_reference(Dataframe::from_rows(
            vec!["A".to_string(), "B".to_string()],
            vec![row(&[("A", "acme"), ("B", "acme")])],
        ))
        .unwrap();

    // Both headers softmax to 0.5 within the group; the shared token must
    // merge into one posting of weight 1.0, not two postings of 0.5.
    let pool = engine.pools().get("Pair").unwrap();
    let bucket = pool.get("$acme$").unwrap();
    assert_eq!(bucket.size(), 1);
    assert!((bucket.entries()[0].weight - 1.0).abs() < 1e-9);
}

#[test]
fn group_weights_sum_to_one_after_ingestion() {
    let engine = scenario_engine();
    for side in [Side::Reference, Side::Target] {
        for block in engine.backbone().groups(side).values() {
            let sum: f64 = block.header_weights().map(|(_, w)| w).sum();
            assert!((sum - 1.0).abs() < 1e-9, "group {} off", block.name());
        }
    }
}

#[test]
fn compare_by_id_is_case_insensitive_on_the_key_columns() {
    let engine = scenario_engine();
    let reference = row(&[("Customer_ID", "AB12")]);
    let target = row(&[("Customer_ID", "ab12")]);
    assert!(engine.compare_by_id(&reference, &target));
    let other = row(&[("Customer_ID", "ab13")]);
    assert!(!engine.compare_by_id(&reference, &other));
}

#[test]
fn engine_info_reflects_the_ingested_index() {
    let engine = scenario_engine();
    let info = engine.info();
    assert_eq!(info.name, "scenario");
    assert_eq!(info.reference_rows, 8);
    assert_eq!(info.reference_groups, 2);
    assert_eq!(info.target_groups, 2);
    assert_eq!(info.pools, 2);
    assert!(info.distinct_tokens > 0);
    assert!(info.postings >= info.distinct_tokens);
}

#[test]
fn empty_reference_table_loads_and_matches_nothing() {
    let mut engine = FuzzyDatabase::new("empty", scenario_backbone());
    engine.load_reference(Dataframe::default()).unwrap();
    let matches = engine.look_up(&row(&[("Customer_Name", "Acme")])).unwrap();
    assert!(matches.is_empty());
}

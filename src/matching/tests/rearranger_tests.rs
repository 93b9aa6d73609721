use super::*;
use crate::matching::rearranger::rearrange_collisions;
use crate::matching::results::{MatchStatus, ResultTuple, ABSENT};

/// Query table where rows 10 and 11 act as the disputed match targets.
fn collision_query_table() -> Dataframe {
    let mut rows: Vec<Row> = Vec::new();
    rows.push(row(&[("Customer_Name", "Acme Corp")])); // query 0
    rows.push(row(&[("Customer_Name", "Beta Holdings")])); // query 1
    for i in 2..10 {
        rows.push(row(&[("Customer_Name", &format!("Filler {i}"))]));
    }
    rows.push(row(&[("Customer_Name", "Acme Corporation")])); // row 10
    rows.push(row(&[("Customer_Name", "Beta Holdings Company")])); // row 11
    Dataframe::from_rows(vec!["Customer_Name".to_string()], rows)
}

fn tuple(query_idx: i64, top_idx: i64, second_idx: i64) -> ResultTuple {
    ResultTuple {
        query_idx,
        top_idx,
        top_weight: 1.0,
        second_idx,
        second_weight: 0.5,
        damerau_sim: 0.0,
        jaccard_sim: 0.0,
        same_id: false,
        status: MatchStatus::Open,
    }
}

#[test]
fn loser_within_threshold_promotes_its_second_match() {
    let query_data = collision_query_table();
    // lev("Acme Corp", "Acme Corporation") = 7
    // lev("Beta Holdings", "Acme Corporation") = 13
    // lev("Beta Holdings", "Beta Holdings Company") = 8
    let mut tuples = vec![tuple(0, 10, 5), tuple(1, 10, 11)];
    rearrange_collisions(&query_data, &mut tuples, 0.20);

    // Winner keeps its pick untouched.
    assert_eq!(tuples[0].top_idx, 10);
    assert_eq!(tuples[0].second_idx, 5);
    assert_eq!(tuples[0].status, MatchStatus::Open);
    // 8 <= 7 * 1.20, so the loser moves onto its runner-up.
    assert_eq!(tuples[1].top_idx, 11);
    assert_eq!(tuples[1].second_idx, ABSENT);
    assert_eq!(tuples[1].status, MatchStatus::Open);
    // No collision survives.
    assert_ne!(tuples[0].top_idx, tuples[1].top_idx);
}

#[test]
fn loser_beyond_threshold_is_verified_in_place() {
    let query_data = collision_query_table();
    // With no slack, 8 > 7 and the loser keeps its pick but is frozen.
    let mut tuples = vec![tuple(0, 10, 5), tuple(1, 10, 11)];
    rearrange_collisions(&query_data, &mut tuples, 0.0);

    assert_eq!(tuples[1].top_idx, 10);
    assert_eq!(tuples[1].second_idx, 11);
    assert_eq!(tuples[1].status, MatchStatus::Verified);
}

#[test]
fn zero_diff_percent_promotes_only_at_equal_or_smaller_distance() {
    // Two queries with identical names collide; distances tie at 0 slack.
    let rows = vec![
        row(&[("Customer_Name", "Acme")]), // query 0
        row(&[("Customer_Name", "Acme")]), // query 1
        row(&[("Customer_Name", "Acme")]), // row 2: disputed pick
        row(&[("Customer_Name", "Acme")]), // row 3: runner-up
    ];
    let query_data = Dataframe::from_rows(vec!["Customer_Name".to_string()], rows);
    let mut tuples = vec![tuple(0, 2, ABSENT), tuple(1, 2, 3)];
    rearrange_collisions(&query_data, &mut tuples, 0.0);
    // d_second == d_winner == 0, so promotion is allowed.
    assert_eq!(tuples[1].top_idx, 3);
}

#[test]
fn loser_without_a_second_match_is_verified() {
    let query_data = collision_query_table();
    let mut tuples = vec![tuple(0, 10, 5), tuple(1, 10, ABSENT)];
    rearrange_collisions(&query_data, &mut tuples, 0.20);
    assert_eq!(tuples[1].top_idx, 10);
    assert_eq!(tuples[1].status, MatchStatus::Verified);
}

#[test]
fn verified_tuples_are_never_touched_again() {
    let query_data = collision_query_table();
    let mut frozen = tuple(1, 10, 11);
    frozen.status = MatchStatus::Verified;
    let mut tuples = vec![tuple(0, 10, 5), frozen];
    rearrange_collisions(&query_data, &mut tuples, 1.0);
    assert_eq!(tuples[1].top_idx, 10);
    assert_eq!(tuples[1].second_idx, 11);
    assert_eq!(tuples[1].status, MatchStatus::Verified);
}

#[test]
fn rearranging_twice_is_idempotent() {
    let query_data = collision_query_table();
    let mut tuples = vec![tuple(0, 10, 5), tuple(1, 10, 11), tuple(2, 4, ABSENT)];
    rearrange_collisions(&query_data, &mut tuples, 0.20);
    let after_first: Vec<(i64, i64)> = tuples.iter().map(|t| (t.top_idx, t.second_idx)).collect();
    rearrange_collisions(&query_data, &mut tuples, 0.20);
    let after_second: Vec<(i64, i64)> = tuples.iter().map(|t| (t.top_idx, t.second_idx)).collect();
    assert_eq!(after_first, after_second);
}

#[test]
fn distinct_top_picks_are_left_alone() {
    let query_data = collision_query_table();
    let mut tuples = vec![tuple(0, 10, 5), tuple(1, 11, 6)];
    rearrange_collisions(&query_data, &mut tuples, 0.20);
    assert_eq!(tuples[0].top_idx, 10);
    assert_eq!(tuples[1].top_idx, 11);
    assert!(tuples.iter().all(|t| t.status == MatchStatus::Open));
}

//! Collision rearrangement: when several query rows share one top candidate,
//! keep it for the closest query and try to move the others to their
//! runner-up.
//!
//! Distances are plain Levenshtein over the first "name"-like column.
//! Matching the system this engine reproduces, both sides of every distance
//! are taken from the *query* table. Each pass either promotes a loser
//! (shrinking one collision group) or verifies a tuple (removing it from all
//! future passes), so the fixed-point loop terminates.

use log::debug;

use crate::matching::results::{MatchStatus, ResultTuple, ABSENT};
use crate::table::{Dataframe, Row};

/// Resolves shared top picks in place.
///
/// `diff_percent` is the promotion slack: a loser's runner-up is promoted
/// when its distance is within `(1 + diff_percent)` of the winner's
/// distance; otherwise the tuple is marked [`MatchStatus::Verified`] and
/// never revisited. With `diff_percent = 0` promotion requires
/// `d_second <= d_winner` exactly.
pub fn rearrange_collisions(
    query_data: &Dataframe,
    tuples: &mut [ResultTuple],
    diff_percent: f64,
) {
    loop {
        let mut changed = false;

        let collision_map = build_collision_map(tuples);
        for (top_idx, positions) in collision_map {
            if positions.len() < 2 {
                continue;
            }
            debug!(
                "collision on reference row {top_idx}: {} query rows",
                positions.len()
            );

            let winner = pick_best_collision(query_data, tuples, &positions);
            let winner_distance =
                name_distance(query_data, tuples[winner].query_idx, tuples[winner].top_idx) as f64;
            for &position in &positions {
                if position == winner {
                    continue;
                }
                if tuples[position].status == MatchStatus::Verified {
                    continue;
                }
                if try_promote_second_match(
                    query_data,
                    tuples,
                    position,
                    winner_distance,
                    diff_percent,
                ) {
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }
}

/// Groups tuple positions by shared `top_idx`, skipping verified tuples.
fn build_collision_map(tuples: &[ResultTuple]) -> Vec<(i64, Vec<usize>)> {
    let mut collision_map: Vec<(i64, Vec<usize>)> = Vec::new();
    for (position, tuple) in tuples.iter().enumerate() {
        if tuple.status == MatchStatus::Verified {
            continue;
        }
        match collision_map.iter_mut().find(|(idx, _)| *idx == tuple.top_idx) {
            Some((_, positions)) => positions.push(position),
            None => collision_map.push((tuple.top_idx, vec![position])),
        }
    }
    collision_map
}

/// Among colliding tuples, the one whose query name is closest to its top
/// pick's name. Verified tuples cannot win.
fn pick_best_collision(
    query_data: &Dataframe,
    tuples: &[ResultTuple],
    positions: &[usize],
) -> usize {
    let mut best_position = positions[0];
    let mut best_distance = usize::MAX;

    for &position in positions {
        let tuple = &tuples[position];
        if tuple.status == MatchStatus::Verified {
            continue;
        }
        let distance = name_distance(query_data, tuple.query_idx, tuple.top_idx);
        if distance < best_distance {
            best_distance = distance;
            best_position = position;
        }
    }
    best_position
}

/// Tries to move a losing tuple onto its runner-up.
///
/// `winner_distance` is the collision group's winning distance, computed
/// once per group. Returns true when a promotion happened. A loser without
/// a valid runner-up, or whose runner-up is too far beyond the winner's
/// distance, is verified instead.
fn try_promote_second_match(
    query_data: &Dataframe,
    tuples: &mut [ResultTuple],
    loser_position: usize,
    winner_distance: f64,
    diff_percent: f64,
) -> bool {
    let second_idx = tuples[loser_position].second_idx;
    if second_idx < 0 {
        tuples[loser_position].status = MatchStatus::Verified;
        return false;
    }

    let loser_query_idx = tuples[loser_position].query_idx;
    let second_distance = name_distance(query_data, loser_query_idx, second_idx) as f64;

    if second_distance <= winner_distance * (1.0 + diff_percent) {
        let loser = &mut tuples[loser_position];
        loser.top_idx = loser.second_idx;
        loser.second_idx = ABSENT;
        true
    } else {
        tuples[loser_position].status = MatchStatus::Verified;
        false
    }
}

/// Levenshtein distance between the name-like columns of two query-table
/// rows. Out-of-range or absent indices contribute an empty name.
fn name_distance(query_data: &Dataframe, query_idx: i64, other_idx: i64) -> usize {
    let query_name = row_name(query_data, query_idx);
    let other_name = row_name(query_data, other_idx);
    strsim::levenshtein(query_name, other_name)
}

fn row_name(query_data: &Dataframe, idx: i64) -> &str {
    if idx < 0 {
        return "";
    }
    query_data
        .get(idx as usize)
        .map(find_name_column_value)
        .unwrap_or("")
}

/// Value of the first column whose lowercase name contains "name"; empty
/// when the row has none.
fn find_name_column_value(row: &Row) -> &str {
    row.iter()
        .find(|(column, _)| column.to_lowercase().contains("name"))
        .map(|(_, value)| value.as_str())
        .unwrap_or("")
}

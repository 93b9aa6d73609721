// Test module organization for the table
// This module is only compiled during testing via #[cfg(test)] in table.rs

use crate::table::{Dataframe, Row, INDEX_COLUMN};


/// Convenience constructor for a row literal.
pub(crate) fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

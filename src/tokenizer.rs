//! Cell tokenization: turns one table cell into a bag of index tokens.
//!
//! A token can be a sentinel-wrapped whole word (`$word$`, `$#word$#`), an
//! even-offset substring cut, a replicated numeric identifier, a replicated
//! whole-input sentinel, or a space-joined n-gram phrase. Duplicate emissions
//! are deliberate: they amplify evidence that is both exact and long, which
//! the bucket-size damping on the scoring side would otherwise flatten.
//!
//! The same function runs on both sides of the match (reference cells during
//! index build, query cells during lookup), so any change here invalidates
//! existing snapshots.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::profile::ScoringProfile;

/// Words removed before shredding, matched case-insensitively after the
/// input has been lowercased.
///
/// Corporate suffixes in English and Spanish plus a small frequency-based
/// blacklist. The list is frozen: it is part of the external interface, and
/// indexes built against one list do not match queries tokenized against
/// another.
pub const STOP_WORDS: &[&str] = &[
    // English corporate suffixes
    "llc", "llp", "lp", "inc", "incorporated", "corp", "corporation", "co",
    "company", "ltd", "limited", "plc", "holdings", "group", "enterprises",
    "international",
    // Spanish corporate suffixes
    "sa", "sl", "srl", "sau", "sas", "sociedad", "anonima", "limitada",
    "compania", "cia", "grupo",
    // Frequency blacklist
    "the", "and", "of", "a", "an", "de", "la", "el", "los", "las", "del",
    "y", "en",
];

/// Numeric identifiers (client numbers, tax ids) are kept intact instead of
/// shredded. Four digits is the cutoff: three-digit numbers shred normally.
static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4,}$").expect("valid literal regex"));

/// Tokenizes a cell value into the token bag used for both indexing and
/// querying.
///
/// The pipeline, in order:
///
/// 1. Empty or whitespace-only input yields no tokens.
/// 2. Trim surrounding punctuation/whitespace, lowercase.
/// 3. Long inputs emit a replicated whole-input sentinel (`$<input>$`):
///    400 copies above 10 characters, 100 copies above 7. This intentionally
///    boosts exact-substring matches for long strings.
/// 4. Strip remaining punctuation, split on whitespace.
/// 5. Drop [`STOP_WORDS`].
/// 6. Per surviving word: emit `$word$` and `$#word$#` once each; numeric
///    identifiers are emitted three times verbatim and not shredded; other
///    words are cut into substrings of each schedule size at even offsets.
/// 7. Append sliding n-gram joins of the surviving word list.
///
/// Deterministic: equal inputs produce equal token sequences.
///
/// # Arguments
///
/// * `input` - The raw cell value
/// * `profile` - Tuning constants (cut schedule, sentinel thresholds/repeats)
///
/// # Examples
///
/// ```
/// use fuzzylink::profile::ScoringProfile;
/// use fuzzylink::tokenizer::tokenize;
///
/// let profile = ScoringProfile::default();
/// assert!(tokenize("", &profile).is_empty());
/// assert!(tokenize("Acme Corp", &profile).contains(&"$acme$".to_string()));
/// ```
pub fn tokenize(input: &str, profile: &ScoringProfile) -> Vec<String> {
    if input.trim().is_empty() {
        return Vec::new();
    }

    let trimmed: String = input
        .trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .to_lowercase();

    let mut tokens: Vec<String> = Vec::new();

    let trimmed_len = trimmed.chars().count();
    if trimmed_len > profile.long_input_len {
        let sentinel = format!("${}$", trimmed);
        tokens.extend(std::iter::repeat(sentinel).take(profile.long_sentinel_repeat));
    } else if trimmed_len > profile.medium_input_len {
        let sentinel = format!("${}$", trimmed);
        tokens.extend(std::iter::repeat(sentinel).take(profile.medium_sentinel_repeat));
    }

    let words = split_words(&trimmed);

    for word in &words {
        tokens.push(format!("${}$", word));
        tokens.push(format!("$#{}$#", word));

        if NUMERIC_ID.is_match(word) {
            // Keep identifiers intact; replication stands in for the cut
            // overlap they would otherwise get.
            tokens.extend(std::iter::repeat(word.clone()).take(profile.numeric_id_repeat));
            continue;
        }

        generate_cuts(word, &profile.cut_sizes, &mut tokens);
    }

    for &window in &profile.ngram_windows {
        if words.len() >= window {
            for phrase in words.windows(window) {
                tokens.push(phrase.join(" "));
            }
        }
    }

    tokens
}

/// Strips punctuation, collapses whitespace, splits into words, and removes
/// stop words. Underscores count as word characters, matching the index-side
/// treatment of header-like values.
fn split_words(trimmed: &str) -> Vec<String> {
    // Punctuation is deleted, not blanked: "Foo-Bar" yields the single
    // word "foobar".
    let cleaned: String = trimmed
        .chars()
        .filter(|&c| c.is_alphanumeric() || c == '_' || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Emits every substring of each schedule size starting at even offsets.
///
/// The even step halves token volume while keeping neighbouring cuts
/// overlapping. Words shorter than a cut size skip that size entirely;
/// duplicated sizes in the schedule emit their cuts twice.
fn generate_cuts(word: &str, cut_sizes: &[usize], tokens: &mut Vec<String>) {
    let chars: Vec<char> = word.chars().collect();
    for &cut in cut_sizes {
        if cut > chars.len() {
            continue;
        }
        let mut start = 0;
        while start + cut <= chars.len() {
            tokens.push(chars[start..start + cut].iter().collect());
            start += 2;
        }
    }
}

// Link to test module (only compiled during tests)
#[cfg(test)]
#[path = "tokenizer/tests/mod.rs"]
mod tests;

use super::*;

fn count(tokens: &[String], needle: &str) -> usize {
    tokens.iter().filter(|t| t.as_str() == needle).count()
}

#[test]
fn long_inputs_replicate_the_whole_input_sentinel_400_times() {
    let profile = ScoringProfile::default();
    // 11 characters, strictly above the long threshold of 10. For a
    // single-word input the word sentinel coincides with the whole-input
    // sentinel, adding one more copy.
    let tokens = tokenize("abcdefghijk", &profile);
    assert_eq!(count(&tokens, "$abcdefghijk$"), 401);
}

#[test]
fn medium_inputs_replicate_the_whole_input_sentinel_100_times() {
    let profile = ScoringProfile::default();
    // 8 characters: above 7, at or below 10. The single word's own
    // sentinel adds one more copy on top of the 100 replications.
    let tokens = tokenize("abcdefgh", &profile);
    assert_eq!(count(&tokens, "$abcdefgh$"), 101);
    // Exactly 10 characters still falls in the medium band.
    let tokens = tokenize("abcdefghij", &profile);
    assert_eq!(count(&tokens, "$abcdefghij$"), 101);
}

#[test]
fn short_inputs_get_no_whole_input_sentinel() {
    let profile = ScoringProfile::default();
    // 7 characters: not strictly above the medium threshold.
    let tokens = tokenize("abcdefg", &profile);
    assert_eq!(count(&tokens, "$abcdefg$"), 1); // word sentinel only
}

#[test]
fn whole_input_sentinel_keeps_inner_punctuation() {
    let profile = ScoringProfile::default();
    let tokens = tokenize("Flat Ridge 4 Wind, LLC", &profile);
    assert_eq!(count(&tokens, "$flat ridge 4 wind, llc$"), 400);
}

#[test]
fn four_digit_ids_are_replicated_not_shredded() {
    let profile = ScoringProfile::default();
    let tokens = tokenize("1234", &profile);
    assert_eq!(count(&tokens, "1234"), 3);
    assert_eq!(count(&tokens, "$1234$"), 1);
    assert_eq!(count(&tokens, "$#1234$#"), 1);
    // Nothing else: no substring cuts of an identifier.
    assert_eq!(tokens.len(), 5);
}

#[test]
fn three_digit_numbers_shred_normally() {
    let profile = ScoringProfile::default();
    let tokens = tokenize("123", &profile);
    // Too short for any cut size and not an identifier: sentinels only.
    assert_eq!(count(&tokens, "123"), 0);
    assert_eq!(count(&tokens, "$123$"), 1);
    assert_eq!(count(&tokens, "$#123$#"), 1);
}

#[test]
fn long_digit_runs_still_count_as_identifiers() {
    let profile = ScoringProfile::default();
    let tokens = tokenize("123456789", &profile);
    assert_eq!(count(&tokens, "123456789"), 3);
    // No cuts either: the 4-size cut of an id would be "1234".
    assert_eq!(count(&tokens, "1234"), 0);
}

#[test]
fn mixed_alphanumerics_are_not_identifiers() {
    let profile = ScoringProfile::default();
    let tokens = tokenize("a1234", &profile);
    assert_eq!(count(&tokens, "a1234"), 1); // size-5 cut, not replication
    assert_eq!(count(&tokens, "a123"), 1); // size-4 cut at offset 0
}

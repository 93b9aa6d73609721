// Test module organization for the tokenizer
// This module is only compiled during testing via #[cfg(test)] in tokenizer.rs

// Import everything from parent module (tokenizer)
use crate::tokenizer::*;
use crate::profile::ScoringProfile;

mod sentinels_and_ids;

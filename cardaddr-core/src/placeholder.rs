//! Placeholder filter: heuristics that catch synthetic test addresses.
//!
//! These checks run in front of the shape validator and are kept apart from
//! it so that checksum verification can replace the shape layer without
//! changing which fixtures are refused.

use std::fmt;

use serde::Serialize;

/// Substrings reserved for intentionally fake fixtures. Case-sensitive.
pub const SENTINEL_SUBSTRINGS: [&str; 2] = ["BTC", "btc"];

/// Minimum digit run after a leading `1` that marks a sequential fixture.
pub const MIN_DIGIT_RUN: usize = 6;

/// Why an address was classified as a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderReason {
    SentinelSubstring,
    DigitRun,
}

impl fmt::Display for PlaceholderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderReason::SentinelSubstring => {
                f.write_str("contains reserved placeholder marker 'BTC'/'btc'")
            }
            PlaceholderReason::DigitRun => {
                write!(f, "'1' followed by {MIN_DIGIT_RUN} or more digits only")
            }
        }
    }
}

/// Check an already-trimmed address against the placeholder heuristics.
pub fn check(trimmed: &str) -> Result<(), PlaceholderReason> {
    if SENTINEL_SUBSTRINGS
        .iter()
        .any(|marker| trimmed.contains(marker))
    {
        return Err(PlaceholderReason::SentinelSubstring);
    }

    if is_digit_run(trimmed) {
        return Err(PlaceholderReason::DigitRun);
    }

    Ok(())
}

/// Whole value is `1` followed by at least `MIN_DIGIT_RUN` ASCII digits.
fn is_digit_run(s: &str) -> bool {
    match s.strip_prefix('1') {
        Some(rest) => rest.len() >= MIN_DIGIT_RUN && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

//! Ignore rules applied before indexing
//!
//! Patterns are canonicalised once when the rules are built, using the same
//! chord canonicalisation and `,` joining as index keys. Matching is then a
//! plain string lookup on the binding's canonical key.

use std::collections::HashSet;

use crate::core::types::{ChordSequence, CHORD_SEPARATOR, SEQUENCE_DELIMITER};

/// Split a comma-joined sequence string into raw chords.
///
/// A `,` right after a `+` (or at the start of a chord) is the comma key,
/// not a delimiter: `"ctrl+,"` is one chord, `"ctrl+k, ctrl+c"` is two.
pub fn split_sequence(raw: &str) -> Vec<String> {
    let mut chords = Vec::new();
    let mut current = String::new();

    for c in raw.chars() {
        let is_delimiter = c == SEQUENCE_DELIMITER
            && !current.trim().is_empty()
            && !current.ends_with(CHORD_SEPARATOR);

        if is_delimiter {
            chords.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }

    if !current.trim().is_empty() {
        chords.push(current.trim().to_string());
    }

    chords
}

/// Rules that exclude bindings from the conflict index
#[derive(Clone, Debug, Default)]
pub struct IgnoreRules {
    patterns: HashSet<String>,
    ignore_single_key: bool,
}

impl IgnoreRules {
    /// Build rules from raw chord sequences (each a list of raw chords).
    pub fn new<I, S>(patterns: I, ignore_single_key: bool) -> Self
    where
        I: IntoIterator<Item = Vec<S>>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter(|chords| !chords.is_empty())
            .map(|chords| ChordSequence::parse(&chords).key())
            .collect();

        Self {
            patterns,
            ignore_single_key,
        }
    }

    /// True when the sequence must not be indexed.
    pub fn is_ignored(&self, sequence: &ChordSequence) -> bool {
        if self.ignore_single_key && sequence.is_single_key() {
            return true;
        }

        self.patterns.contains(&sequence.key())
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

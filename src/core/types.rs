//! src/core/types.rs
//!
//! Core type definitions for key binding conflict detection
//!
//! This module defines the fundamental types used throughout the application:
//! - `Modifier`: Keyboard modifier tokens (alt, ctrl, shift, super)
//! - `KeyChord`: One simultaneous key press, kept in canonical order
//! - `ChordSequence`: Ordered chords pressed one after another
//! - `Keybinding`: A decoded binding entry with command, args and context
//!
//! Canonicalisation happens at construction time, so two chords typed in a
//! different token order compare (and hash) equal.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Separates tokens inside one chord (`ctrl+shift+p`).
pub const CHORD_SEPARATOR: char = '+';

/// Separates chords inside a sequence key (`ctrl+k,ctrl+c`).
pub const SEQUENCE_DELIMITER: char = ',';

/// Keyboard modifier tokens
///
/// Variants are declared in lexicographic order of their token names, so the
/// derived `Ord` sorts them the same way the canonical string does.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    /// Alt / Option key
    Alt,
    /// Control key
    Ctrl,
    /// Shift key
    Shift,
    /// Super / Windows / Command key
    Super,
}

impl Modifier {
    /// Exact membership test against the fixed modifier set.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "alt" => Some(Modifier::Alt),
            "ctrl" => Some(Modifier::Ctrl),
            "shift" => Some(Modifier::Shift),
            "super" => Some(Modifier::Super),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::Alt => "alt",
            Modifier::Ctrl => "ctrl",
            Modifier::Shift => "shift",
            Modifier::Super => "super",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chord: modifier tokens plus one or more key tokens
///
/// # Canonical form
/// Modifiers sorted lexicographically, then the remaining key tokens sorted
/// lexicographically, all joined by `+`. `shift+ctrl+a`, `a+ctrl+shift` and
/// `ctrl+shift+a` all produce the same `KeyChord`.
///
/// # The `+` key
/// Splitting `ctrl++` on the separator yields an empty token. Empty tokens are
/// reinterpreted as the literal `+` key instead of being dropped.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct KeyChord {
    /// Modifier tokens, sorted
    pub modifiers: Vec<Modifier>,

    /// Non-modifier key tokens, sorted
    pub keys: Vec<String>,
}

impl KeyChord {
    /// Create a new KeyChord with normalised token order
    pub fn new(mut modifiers: Vec<Modifier>, mut keys: Vec<String>) -> Self {
        modifiers.sort();
        keys.sort();

        Self { modifiers, keys }
    }

    /// Parse a raw chord string such as `"shift+ctrl+p"`
    ///
    /// Total over every input string: there is no failure case.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let mut modifiers = Vec::new();
        let mut keys = Vec::new();
        let mut plus_key = false;

        for token in raw.split(CHORD_SEPARATOR) {
            if token.is_empty() {
                // Adjacent to a separator: this is the "+" key itself
                plus_key = true;
                continue;
            }

            match Modifier::from_token(token) {
                Some(modifier) => modifiers.push(modifier),
                None => keys.push(token.to_string()),
            }
        }

        if plus_key {
            keys.push(CHORD_SEPARATOR.to_string());
        }

        Self::new(modifiers, keys)
    }

    /// Number of tokens after the `+` key fixup
    pub fn token_count(&self) -> usize {
        self.modifiers.len() + self.keys.len()
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = self
            .modifiers
            .iter()
            .map(|m| m.as_str())
            .chain(self.keys.iter().map(String::as_str));

        for (i, token) in tokens.enumerate() {
            if i > 0 {
                write!(f, "{}", CHORD_SEPARATOR)?;
            }
            f.write_str(token)?;
        }

        Ok(())
    }
}

/// Canonicalise one raw chord string.
///
/// Idempotent: `canonicalize_chord(&canonicalize_chord(x)) == canonicalize_chord(x)`.
pub fn canonicalize_chord(raw: &str) -> String {
    KeyChord::parse(raw).to_string()
}

/// An ordered sequence of chords
///
/// Chord order is significant and preserved. The index key joins the
/// canonical chords with `,`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ChordSequence {
    chords: Vec<KeyChord>,
}

impl ChordSequence {
    pub fn new(chords: Vec<KeyChord>) -> Self {
        Self { chords }
    }

    /// Canonicalise every raw chord, keeping sequence order.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Self {
        Self::new(raw.iter().map(|chord| KeyChord::parse(chord.as_ref())).collect())
    }

    pub fn chords(&self) -> &[KeyChord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// Canonical index key, e.g. `ctrl+k,ctrl+c`
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Exactly one chord made of exactly one token.
    pub fn is_single_key(&self) -> bool {
        matches!(self.chords.as_slice(), [only] if only.token_count() == 1)
    }

    /// Index keys of every strict, non-empty prefix, shortest first.
    pub fn prefix_keys(&self) -> Vec<String> {
        (1..self.chords.len())
            .map(|n| ChordSequence::new(self.chords[..n].to_vec()).key())
            .collect()
    }
}

impl fmt::Display for ChordSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEQUENCE_DELIMITER)?;
            }
            write!(f, "{}", chord)?;
        }

        Ok(())
    }
}

impl Serialize for ChordSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A decoded key binding entry
///
/// `args` and `context` are carried verbatim for display and never take part
/// in conflict detection; only `sequence` does.
///
/// # Example
/// ```ignore
/// let binding = Keybinding {
///     sequence: ChordSequence::parse(&["ctrl+k", "ctrl+c"]),
///     command: "toggle_comment".to_string(),
///     args: None,
///     context: None,
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Keybinding {
    /// Canonical chord sequence that triggers this binding
    #[serde(rename = "keys")]
    pub sequence: ChordSequence,

    /// Command name; empty when the entry had none
    pub command: String,

    /// Opaque command arguments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,

    /// Context conditions, in encounter order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<Value>>,
}

impl Keybinding {
    pub fn key(&self) -> String {
        self.sequence.key()
    }
}

impl fmt::Display for Keybinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.sequence, self.command)?;

        if let Some(args) = &self.args {
            write!(f, " {}", args)?;
        }

        Ok(())
    }
}

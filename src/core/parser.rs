// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/parser.rs
//!
//! Keymap file parser
//!
//! This module turns the text of one keymap file into keybindings. It handles:
//! - Comments and dangling commas (via `relaxed_json`)
//! - A leading UTF-8 byte order mark
//! - Per-entry extraction of `keys`, `command`, `args` and `context`
//!
//! # Architecture
//! A malformed document fails the whole file with `ParseError`. A malformed
//! entry only skips that entry: it is reported in `ParsedKeymap::skipped`
//! and the remaining entries are still returned.
//!
//! # Example
//! ```ignore
//! let keymap = parse_keymap_file(r#"[{"keys": ["ctrl+c"], "command": "copy"}]"#, "Default.sublime-keymap")?;
//! assert_eq!(keymap.bindings[0].key(), "ctrl+c");
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::core::relaxed_json;
use crate::core::types::{ChordSequence, Keybinding};

/// File-level parse errors
#[derive(Debug, Error)]
pub enum ParseError {
    /// Text is still invalid JSON after comments and dangling commas are removed
    #[error("Failed to decode {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a top-level array of bindings in {file}")]
    NotAnArray { file: String },

    #[error("{file} is not valid UTF-8")]
    InvalidUtf8 { file: String },
}

impl ParseError {
    /// Identity of the file that failed to parse
    pub fn file(&self) -> &str {
        match self {
            ParseError::Decode { file, .. }
            | ParseError::NotAnArray { file }
            | ParseError::InvalidUtf8 { file } => file,
        }
    }
}

/// Entry-level extraction errors. The entry is skipped, the file is not.
#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("Entry {index} in {file} has no `{field}` field")]
    MissingField {
        file: String,
        index: usize,
        field: &'static str,
    },

    #[error("Entry {index} in {file}: `{field}` {reason}")]
    InvalidField {
        file: String,
        index: usize,
        field: &'static str,
        reason: &'static str,
    },
}

/// Result of parsing one keymap file
#[derive(Debug, Default)]
pub struct ParsedKeymap {
    /// Successfully extracted bindings, in file order
    pub bindings: Vec<Keybinding>,

    /// Entries that were skipped
    pub skipped: Vec<EntryError>,
}

/// Parse a raw keymap file
///
/// # Arguments
/// * `bytes` - File contents as read from the package
/// * `file` - File identity used in error messages
pub fn parse_keymap_bytes(bytes: &[u8], file: &str) -> Result<ParsedKeymap, ParseError> {
    let content = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8 {
        file: file.to_string(),
    })?;

    parse_keymap_file(content, file)
}

/// Parse the text of a keymap file
///
/// # Returns
/// All extractable bindings plus the list of skipped entries, or a
/// `ParseError` when the document itself cannot be decoded.
pub fn parse_keymap_file(content: &str, file: &str) -> Result<ParsedKeymap, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let document = relaxed_json::from_str(content).map_err(|source| ParseError::Decode {
        file: file.to_string(),
        source,
    })?;

    let Value::Array(entries) = document else {
        return Err(ParseError::NotAnArray {
            file: file.to_string(),
        });
    };

    let mut keymap = ParsedKeymap::default();

    for (index, entry) in entries.iter().enumerate() {
        match extract_binding(entry, file, index) {
            Ok(binding) => keymap.bindings.push(binding),
            Err(e) => keymap.skipped.push(e),
        }
    }

    Ok(keymap)
}

/// Extract one binding from a decoded entry
///
/// `keys` is required and must be a non-empty array of strings. `command`
/// defaults to the empty string; `args` and `context` are kept verbatim.
pub fn extract_binding(entry: &Value, file: &str, index: usize) -> Result<Keybinding, EntryError> {
    let invalid = |reason: &'static str| EntryError::InvalidField {
        file: file.to_string(),
        index,
        field: "keys",
        reason,
    };

    let keys = entry.get("keys").ok_or_else(|| EntryError::MissingField {
        file: file.to_string(),
        index,
        field: "keys",
    })?;

    let raw_chords = keys
        .as_array()
        .ok_or_else(|| invalid("must be an array"))?
        .iter()
        .map(|chord| chord.as_str().ok_or_else(|| invalid("must only contain strings")))
        .collect::<Result<Vec<_>, _>>()?;

    if raw_chords.is_empty() {
        return Err(invalid("must contain at least one chord"));
    }

    let command = entry
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(Keybinding {
        sequence: ChordSequence::parse(&raw_chords),
        command,
        args: entry.get("args").cloned(),
        context: entry.get("context").and_then(Value::as_array).cloned(),
    })
}

// Copyright 2025 bakri (tidynest@proton.me)
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

//! src/core/mod.rs
//!
//! Core business logic module
//!
//! This module contains the fundamental data structures and algorithms
//! for key binding conflict detection, including:
//! - Type definitions for chords, chord sequences and bindings
//! - Relaxed JSON cleaning and decoding
//! - Keymap entry extraction
//! - Ignore rules
//! - Conflict and overlap detection over a sorted index
//!
//! Nothing here touches the filesystem, so every piece is unit tested
//! with in-memory input.

pub mod conflict;
pub mod ignore;
pub mod parser;
pub mod relaxed_json;
pub mod types;

pub use conflict::{Conflict, ConflictDetector, KeyEntry, Overlap};
pub use ignore::IgnoreRules;
pub use parser::{EntryError, ParseError, ParsedKeymap};
pub use types::*;

#[cfg(test)]
mod tests;

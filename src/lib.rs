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

//! Find Key Conflicts
//!
//! Finds key bindings that collide across the packages of an editor
//! installation, and key sequences that shadow longer multi-chord ones.
//!
//! # Features
//!
//! - **Relaxed keymaps:** Comments and dangling commas are accepted
//! - **Canonical keys:** `c+ctrl` and `ctrl+c` are the same key
//! - **Direct conflicts:** One key, several packages (or one package, twice)
//! - **Overlaps:** `ctrl+k` swallowing `ctrl+k, ctrl+c`
//! - **Platform variants:** `Default (Linux).sublime-keymap` merges into its package
//! - **Ignore rules:** Whole packages, single keys, or exact sequences
//! - **Background scan:** Cancellable worker with progress reporting
//!
//! # Architecture
//!
//! - **`core`:** Business logic (types, relaxed JSON, parser, ignore rules, conflict index)
//! - **`config`:** Scan settings loaded from a relaxed JSON file
//! - **`host`:** Package enumeration and file access behind a trait
//! - **`scan`:** Processing order, failure recovery, worker thread
//! - **`report`:** Terminal, text and JSON presenters
//! - **`watch`:** Re-scan trigger on keymap changes
//!
//! # Examples
//!
//! ## Detecting conflicts in memory
//!
//! ```
//! use find_key_conflicts::core::parser::parse_keymap_file;
//! use find_key_conflicts::core::ConflictDetector;
//!
//! let base = parse_keymap_file(r#"[{ "keys": ["ctrl+c"], "command": "copy" }]"#, "Default")?;
//! let user = parse_keymap_file(r#"[{ "keys": ["c+ctrl"], "command": "mine" },]"#, "Mine")?;
//!
//! let mut detector = ConflictDetector::new();
//! for binding in base.bindings {
//!     detector.add_binding("Default", binding);
//! }
//! for binding in user.bindings {
//!     detector.add_binding("Mine", binding);
//! }
//!
//! let conflicts = detector.find_conflicts(false);
//! assert_eq!(conflicts[0].key, "ctrl+c");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Scanning a packages directory
//!
//! ```no_run
//! use find_key_conflicts::config::ScanConfig;
//! use find_key_conflicts::host::{DirectorySource, Platform};
//! use find_key_conflicts::scan::{NoAlerts, Scanner};
//!
//! let source = DirectorySource::new("/tmp/Packages".into(), Platform::current());
//! let outcome = Scanner::new(source, ScanConfig::default()).scan(&NoAlerts);
//!
//! for overlap in outcome.detector.find_overlaps() {
//!     println!("{} shadows {:?}", overlap.prefix, overlap.extensions);
//! }
//! ```

pub mod config;
pub mod core;
pub mod host;
pub mod report;
pub mod scan;
pub mod watch;

// Re-export commonly used types for convenience
pub use core::{ChordSequence, ConflictDetector, KeyChord, Keybinding, Modifier};

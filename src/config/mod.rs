//! Run configuration for a conflict scan.
//!
//! This module holds the options a scan is run with. The configuration is
//! a plain value built once per run and handed to the scanner; nothing here
//! is global. Key features:
//!
//! - **Relaxed settings files**: comments and dangling commas are accepted
//! - **Defaults for everything**: a missing key falls back to its default
//! - **Two pattern spellings**: `["ctrl+k", "ctrl+c"]` or `"ctrl+k, ctrl+c"`
//!
//! # Example
//!
//! ```no_run
//! use find_key_conflicts::config::ScanConfig;
//!
//! let config = ScanConfig::load("FindKeyConflicts.sublime-settings".as_ref())?;
//! let rules = config.ignore_rules();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;

pub use error::ConfigError;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::ignore::{split_sequence, IgnoreRules};
use crate::core::relaxed_json;

/// One entry of `ignore_patterns`
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum IgnorePattern {
    /// Raw chords, one per element
    Chords(Vec<String>),
    /// A single string with chords joined by `,`
    Joined(String),
}

impl IgnorePattern {
    /// Raw chords of this pattern, in sequence order
    pub fn chords(&self) -> Vec<String> {
        match self {
            IgnorePattern::Chords(chords) => chords.clone(),
            IgnorePattern::Joined(joined) => split_sequence(joined),
        }
    }
}

/// Options for one scan.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Packages skipped entirely (the base and user layers are never skipped)
    pub ignored_packages: Vec<String>,

    /// Drop bindings made of one chord with one token
    pub ignore_single_key: bool,

    /// Sequences excluded from the index
    pub ignore_patterns: Vec<IgnorePattern>,

    /// Report keys bound more than once inside a single package
    pub display_internal_conflicts: bool,

    /// Sort context conditions when displaying (presentation only)
    pub sort_context: bool,
}

impl ScanConfig {
    /// Loads settings from a relaxed JSON object file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist and
    /// `ConfigError::Parse` if it isn't a valid settings object.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parses settings text; `path` is only used for error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let parse_error = |source: serde_json::Error| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        };

        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let value = relaxed_json::from_str(content).map_err(parse_error)?;
        serde_json::from_value(value).map_err(parse_error)
    }

    /// Pre-canonicalised ignore rules for this run
    pub fn ignore_rules(&self) -> IgnoreRules {
        IgnoreRules::new(
            self.ignore_patterns.iter().map(IgnorePattern::chords),
            self.ignore_single_key,
        )
    }

    pub fn is_package_ignored(&self, package: &str) -> bool {
        self.ignored_packages.iter().any(|ignored| ignored == package)
    }
}

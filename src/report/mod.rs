//! Conflict report rendering
//!
//! Turns a built `ConflictDetector` into something a person (or another
//! tool) can read. Three report kinds:
//! - `conflicts`: direct conflicts only
//! - `overlaps`: prefix keys and the longer keys they shadow
//! - `all`: every indexed key
//!
//! and three output modes: coloured `terminal`, flat `text` with a fixed
//! column layout, and `json`. Keys are always listed in lexicographic order,
//! packages in processing order, bindings in file order.

mod text;

pub use text::{binding_line, render_terminal, render_text, COMMAND_WIDTH, PACKAGE_WIDTH};

use atomic_write_file::AtomicWriteFile;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::core::{ConflictDetector, KeyEntry, Keybinding};

/// Report errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// Requested output mode is not one of terminal, text or json
    #[error("Unknown output mode '{0}': expected terminal, text or json")]
    InvalidOutputMode(String),

    #[error("Failed to serialise report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which view of the index to render
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Conflicts,
    Overlaps,
    All,
}

/// How to render it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    #[default]
    Terminal,
    Text,
    Json,
}

impl FromStr for OutputMode {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputMode::Terminal),
            "text" => Ok(OutputMode::Text),
            "json" => Ok(OutputMode::Json),
            _ => Err(ReportError::InvalidOutputMode(s.to_string())),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Terminal => write!(f, "terminal"),
            OutputMode::Text => write!(f, "text"),
            OutputMode::Json => write!(f, "json"),
        }
    }
}

/// Presentation options
#[derive(Clone, Debug, Default)]
pub struct ReportOptions {
    /// Count same-package duplicates as conflicts
    pub include_internal: bool,

    /// Show context conditions sorted instead of in file order
    pub sort_context: bool,

    /// Case-insensitive substring matched against keys and commands
    pub filter: Option<String>,
}

/// One key of a report, with the longer keys it shadows (overlaps only)
#[derive(Clone, Debug)]
pub struct Section<'a> {
    pub key: &'a str,
    pub entry: &'a KeyEntry,
    pub extensions: Vec<(&'a str, &'a KeyEntry)>,
}

impl Section<'_> {
    fn matches(&self, needle: &str) -> bool {
        let hit = |key: &str, entry: &KeyEntry| {
            key.to_lowercase().contains(needle)
                || entry
                    .packages
                    .values()
                    .flatten()
                    .any(|binding| binding.command.to_lowercase().contains(needle))
        };

        hit(self.key, self.entry)
            || self
                .extensions
                .iter()
                .any(|&(key, entry)| hit(key, entry))
    }
}

/// Collects the sections of a report, filtered and in key order.
pub fn sections<'a>(
    detector: &'a ConflictDetector,
    kind: ReportKind,
    options: &ReportOptions,
) -> Vec<Section<'a>> {
    let all: Vec<Section<'a>> = match kind {
        ReportKind::Conflicts => detector
            .find_conflicts(options.include_internal)
            .into_iter()
            .map(|conflict| Section {
                key: conflict.key,
                entry: conflict.entry,
                extensions: Vec::new(),
            })
            .collect(),
        ReportKind::Overlaps => detector
            .find_overlaps()
            .into_iter()
            .filter_map(|overlap| {
                let entry = detector.get(overlap.prefix)?;
                let extensions = overlap
                    .extensions
                    .into_iter()
                    .filter_map(|key| detector.get(key).map(|entry| (key, entry)))
                    .collect();
                Some(Section {
                    key: overlap.prefix,
                    entry,
                    extensions,
                })
            })
            .collect(),
        ReportKind::All => detector
            .entries()
            .map(|(key, entry)| Section {
                key,
                entry,
                extensions: Vec::new(),
            })
            .collect(),
    };

    match options.filter.as_deref().map(str::to_lowercase) {
        Some(needle) if !needle.is_empty() => {
            all.into_iter().filter(|section| section.matches(&needle)).collect()
        }
        _ => all,
    }
}

/// Context conditions as they should be displayed
pub fn display_context(binding: &Keybinding, sort: bool) -> Option<Vec<&Value>> {
    let mut context: Vec<&Value> = binding.context.as_ref()?.iter().collect();
    if sort {
        context.sort_by_cached_key(|condition| condition.to_string());
    }
    Some(context)
}

#[derive(Serialize)]
struct BindingView<'a> {
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Vec<&'a Value>>,
}

type PackageView<'a> = IndexMap<&'a str, Vec<BindingView<'a>>>;

fn package_view<'a>(entry: &'a KeyEntry, sort_context: bool) -> PackageView<'a> {
    entry
        .packages
        .iter()
        .map(|(package, bindings)| {
            let views = bindings
                .iter()
                .map(|binding| BindingView {
                    command: &binding.command,
                    args: binding.args.as_ref(),
                    context: display_context(binding, sort_context),
                })
                .collect();
            (package.as_str(), views)
        })
        .collect()
}

#[derive(Serialize)]
struct OverlapView<'a> {
    bindings: PackageView<'a>,
    shadows: IndexMap<&'a str, PackageView<'a>>,
}

/// Pretty JSON: key -> package -> bindings (overlaps add `shadows`)
pub fn render_json(
    detector: &ConflictDetector,
    kind: ReportKind,
    options: &ReportOptions,
) -> Result<String, ReportError> {
    let sections = sections(detector, kind, options);

    let json = match kind {
        ReportKind::Overlaps => {
            let view: BTreeMap<&str, OverlapView<'_>> = sections
                .iter()
                .map(|section| {
                    let shadows = section
                        .extensions
                        .iter()
                        .map(|&(key, entry)| (key, package_view(entry, options.sort_context)))
                        .collect();
                    let view = OverlapView {
                        bindings: package_view(section.entry, options.sort_context),
                        shadows,
                    };
                    (section.key, view)
                })
                .collect();
            serde_json::to_string_pretty(&view)?
        }
        ReportKind::Conflicts | ReportKind::All => {
            let view: BTreeMap<&str, PackageView<'_>> = sections
                .iter()
                .map(|section| (section.key, package_view(section.entry, options.sort_context)))
                .collect();
            serde_json::to_string_pretty(&view)?
        }
    };

    Ok(json)
}

/// Renders a report in the requested mode.
pub fn render(
    detector: &ConflictDetector,
    kind: ReportKind,
    mode: OutputMode,
    options: &ReportOptions,
) -> Result<String, ReportError> {
    match mode {
        OutputMode::Terminal => Ok(render_terminal(detector, kind, options)),
        OutputMode::Text => Ok(render_text(detector, kind, options)),
        OutputMode::Json => render_json(detector, kind, options),
    }
}

/// Writes a rendered report atomically: readers see the old file or the
/// new one, never a partial write.
pub fn write_report(path: &Path, content: &str) -> Result<(), ReportError> {
    let write_error = |source: io::Error| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = AtomicWriteFile::options()
        .open(path)
        .map_err(write_error)?;
    file.write_all(content.as_bytes()).map_err(write_error)?;
    file.commit().map_err(write_error)?;

    Ok(())
}

#[cfg(test)]
mod tests;

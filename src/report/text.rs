//! Text and terminal presenters
//!
//! Flat text keeps a fixed column layout so reports can be diffed and
//! grepped:
//!
//! ```text
//! [ctrl+c]
//!     copy                                     Default
//!     custom_copy                              UserPkg                   [{"key":"selector"}]
//! ```
//!
//! The terminal presenter shows the same data coloured and numbered.

use colored::*;
use serde_json::Value;
use std::fmt::Write;

use super::{display_context, sections, ReportKind, ReportOptions, Section};
use crate::core::{ConflictDetector, KeyEntry, Keybinding};

/// Command column width, in characters
pub const COMMAND_WIDTH: usize = 40;

/// Package column width, in characters
pub const PACKAGE_WIDTH: usize = 25;

const INDENT: &str = "    ";

fn context_json(binding: &Keybinding, sort_context: bool) -> Option<String> {
    display_context(binding, sort_context)
        .map(|context| Value::Array(context.into_iter().cloned().collect()).to_string())
}

/// One binding in the fixed column layout, trailing spaces trimmed.
///
/// Each padded column is followed by one space, so an overlong command or
/// package name never runs into the next column.
pub fn binding_line(binding: &Keybinding, package: &str, sort_context: bool) -> String {
    let context = context_json(binding, sort_context).unwrap_or_default();
    let line = format!(
        "{}{:<cw$} {:<pw$} {}",
        INDENT,
        binding.command,
        package,
        context,
        cw = COMMAND_WIDTH,
        pw = PACKAGE_WIDTH,
    );
    line.trim_end().to_string()
}

fn write_entry_lines(out: &mut String, entry: &KeyEntry, sort_context: bool) {
    for (package, bindings) in &entry.packages {
        for binding in bindings {
            let _ = writeln!(out, "{}", binding_line(binding, package, sort_context));
        }
    }
}

/// Flat text report. Sections are separated by a blank line.
pub fn render_text(detector: &ConflictDetector, kind: ReportKind, options: &ReportOptions) -> String {
    let mut out = String::new();

    for (i, section) in sections(detector, kind, options).iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "[{}]", section.key);
        write_entry_lines(&mut out, section.entry, options.sort_context);

        for (key, entry) in &section.extensions {
            let _ = writeln!(out, "  [{}]", key);
            write_entry_lines(&mut out, entry, options.sort_context);
        }
    }

    out
}

fn terminal_bindings(out: &mut String, entry: &KeyEntry, sort_context: bool, indent: &str) {
    let mut idx = 0;
    for (package, bindings) in &entry.packages {
        for binding in bindings {
            idx += 1;
            let args = binding
                .args
                .as_ref()
                .map(|args| args.to_string())
                .unwrap_or_default();

            let _ = writeln!(
                out,
                "{}{} {} → {} {}",
                indent,
                format!("{}.", idx).dimmed(),
                package.magenta(),
                binding.command.green(),
                args.dimmed(),
            );

            if let Some(context) = context_json(binding, sort_context) {
                let _ = writeln!(out, "{}   {} {}", indent, "context:".dimmed(), context.dimmed());
            }
        }
    }
}

fn terminal_heading(kind: ReportKind, number: usize, section: &Section<'_>) -> String {
    match kind {
        ReportKind::Conflicts => format!(
            "{} {}",
            format!("Conflict {}", number).yellow().bold(),
            section.key.cyan()
        ),
        ReportKind::Overlaps => format!(
            "{} {} {}",
            format!("Overlap {}", number).yellow().bold(),
            section.key.cyan(),
            format!("shadows {}", section.extensions.len()).dimmed()
        ),
        ReportKind::All => format!("{}", section.key.cyan().bold()),
    }
}

/// Coloured, numbered report for an interactive terminal.
pub fn render_terminal(
    detector: &ConflictDetector,
    kind: ReportKind,
    options: &ReportOptions,
) -> String {
    let mut out = String::new();

    for (i, section) in sections(detector, kind, options).iter().enumerate() {
        let _ = writeln!(out, "{}", terminal_heading(kind, i + 1, section));
        terminal_bindings(&mut out, section.entry, options.sort_context, "  ");

        for (key, entry) in &section.extensions {
            let _ = writeln!(out, "  {} {}", "↳".dimmed(), key.cyan());
            terminal_bindings(&mut out, entry, options.sort_context, "    ");
        }
        out.push('\n');
    }

    out
}

//! Report module tests
//!
//! Output mode parsing, the fixed column text layout, JSON shape,
//! filtering and the atomic report write.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

use crate::core::{ChordSequence, ConflictDetector, Keybinding};
use crate::report::*;

fn binding(keys: &[&str], command: &str, context: Option<Value>) -> Keybinding {
    Keybinding {
        sequence: ChordSequence::parse(keys),
        command: command.to_string(),
        args: None,
        context: context.and_then(|c| c.as_array().cloned()),
    }
}

/// Helper: two packages fighting over ctrl+c, plus a chord overlap
fn sample_detector() -> ConflictDetector {
    let mut detector = ConflictDetector::new();
    detector.add_binding("Default", binding(&["ctrl+c"], "copy", None));
    detector.add_binding(
        "UserPkg",
        binding(
            &["c+ctrl"],
            "custom_copy",
            Some(json!([{"key": "selector", "operand": "source.rust"}, {"key": "auto_complete_visible"}])),
        ),
    );
    detector.add_binding("Default", binding(&["ctrl+k"], "kill", None));
    detector.add_binding("Default", binding(&["ctrl+k", "ctrl+u"], "upper_case", None));
    detector
}

#[test]
fn test_output_mode_parsing() {
    assert_eq!("terminal".parse::<OutputMode>().unwrap(), OutputMode::Terminal);
    assert_eq!("TEXT".parse::<OutputMode>().unwrap(), OutputMode::Text);
    assert_eq!("json".parse::<OutputMode>().unwrap(), OutputMode::Json);

    let err = "yaml".parse::<OutputMode>().unwrap_err();
    assert!(matches!(err, ReportError::InvalidOutputMode(ref mode) if mode == "yaml"));
    assert!(err.to_string().contains("yaml"));
}

#[test]
fn test_binding_line_columns() {
    let plain = binding(&["ctrl+c"], "copy", None);
    assert_eq!(
        binding_line(&plain, "Default", false),
        format!("    {:<40} Default", "copy")
    );

    let with_context = binding(&["ctrl+c"], "copy", Some(json!([{"key": "selector"}])));
    assert_eq!(
        binding_line(&with_context, "Default", false),
        format!("    {:<40} {:<25} [{{\"key\":\"selector\"}}]", "copy", "Default")
    );
}

#[test]
fn test_overlong_columns_stay_separated() {
    let command = "a_very_long_command_name_that_exceeds_forty";
    let package = "SublimeLinter-contrib-eslint-x";
    let long = binding(&["ctrl+l"], command, Some(json!([{"key": "selector"}])));

    let line = binding_line(&long, package, false);
    let columns: Vec<&str> = line.split_whitespace().collect();

    assert_eq!(columns, vec![command, package, "[{\"key\":\"selector\"}]"]);
}

#[test]
fn test_text_conflicts_report() {
    let detector = sample_detector();
    let text = render_text(&detector, ReportKind::Conflicts, &ReportOptions::default());
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "[ctrl+c]");
    assert_eq!(lines[1], format!("    {:<40} Default", "copy"));
    assert!(lines[2].starts_with(&format!("    {:<40} {:<25} [", "custom_copy", "UserPkg")));
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_context_kept_in_file_order_unless_sorted() {
    let detector = sample_detector();
    let entry = detector.get("ctrl+c").unwrap();
    let custom = &entry.packages["UserPkg"][0];

    let as_is = binding_line(custom, "UserPkg", false);
    let sorted = binding_line(custom, "UserPkg", true);

    assert!(as_is.find("selector").unwrap() < as_is.find("auto_complete_visible").unwrap());
    assert!(sorted.find("auto_complete_visible").unwrap() < sorted.find("selector").unwrap());
}

#[test]
fn test_text_overlaps_report() {
    let detector = sample_detector();
    let text = render_text(&detector, ReportKind::Overlaps, &ReportOptions::default());

    let expected = format!(
        "[ctrl+k]\n    {:<40} Default\n  [ctrl+k,ctrl+u]\n    {:<40} Default\n",
        "kill", "upper_case"
    );
    assert_eq!(text, expected);
}

#[test]
fn test_text_all_report_lists_every_key() {
    let detector = sample_detector();
    let text = render_text(&detector, ReportKind::All, &ReportOptions::default());

    let headers: Vec<&str> = text.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(headers, vec!["[ctrl+c]", "[ctrl+k]", "[ctrl+k,ctrl+u]"]);
}

#[test]
fn test_filter_matches_keys_and_commands() {
    let detector = sample_detector();

    let by_command = ReportOptions {
        filter: Some("UPPER".to_string()),
        ..ReportOptions::default()
    };
    let found = sections(&detector, ReportKind::All, &by_command);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key, "ctrl+k,ctrl+u");

    let by_key = ReportOptions {
        filter: Some("ctrl+c".to_string()),
        ..ReportOptions::default()
    };
    assert_eq!(sections(&detector, ReportKind::Conflicts, &by_key).len(), 1);

    let nothing = ReportOptions {
        filter: Some("zzz".to_string()),
        ..ReportOptions::default()
    };
    assert!(render_text(&detector, ReportKind::All, &nothing).is_empty());
}

#[test]
fn test_json_conflicts_shape() {
    let detector = sample_detector();
    let output = render_json(&detector, ReportKind::Conflicts, &ReportOptions::default()).unwrap();
    let parsed: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(parsed["ctrl+c"]["Default"][0]["command"], "copy");
    assert!(parsed["ctrl+c"]["Default"][0].get("context").is_none());
    assert_eq!(parsed["ctrl+c"]["UserPkg"][0]["context"][0]["key"], "selector");
    assert!(parsed.get("ctrl+k").is_none());
}

#[test]
fn test_json_keeps_package_processing_order() {
    let mut detector = ConflictDetector::new();
    detector.add_binding("Zed", binding(&["f1"], "z", None));
    detector.add_binding("Alpha", binding(&["f1"], "a", None));

    let output = render_json(&detector, ReportKind::Conflicts, &ReportOptions::default()).unwrap();
    assert!(output.find("\"Zed\"").unwrap() < output.find("\"Alpha\"").unwrap());
}

#[test]
fn test_json_overlaps_shape() {
    let detector = sample_detector();
    let output = render(&detector, ReportKind::Overlaps, OutputMode::Json, &ReportOptions::default()).unwrap();
    let parsed: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(parsed["ctrl+k"]["bindings"]["Default"][0]["command"], "kill");
    assert_eq!(
        parsed["ctrl+k"]["shadows"]["ctrl+k,ctrl+u"]["Default"][0]["command"],
        "upper_case"
    );
}

#[test]
fn test_terminal_report_numbers_conflicts() {
    let detector = sample_detector();
    let output = render(&detector, ReportKind::Conflicts, OutputMode::Terminal, &ReportOptions::default()).unwrap();

    assert!(output.contains("Conflict 1"));
    assert!(!output.contains("Conflict 2"));
    assert!(output.contains("custom_copy"));
}

#[test]
fn test_empty_report() {
    let detector = ConflictDetector::new();
    let options = ReportOptions::default();

    assert!(render_text(&detector, ReportKind::Conflicts, &options).is_empty());
    assert_eq!(render_json(&detector, ReportKind::Conflicts, &options).unwrap(), "{}");
}

#[test]
fn test_write_report_replaces_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("conflicts.txt");

    fs::write(&path, "stale").unwrap();
    write_report(&path, "[ctrl+c]\n").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[ctrl+c]\n");
}

#[test]
fn test_write_report_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("no/such/dir/report.txt");

    let err = write_report(&path, "x").unwrap_err();
    assert!(matches!(err, ReportError::Write { .. }));
}

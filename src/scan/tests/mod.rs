//! Scan module tests
//!
//! End-to-end runs over in-memory packages:
//! - Keymap file selection per platform
//! - Package processing order
//! - Failure recovery and the single alert
//! - Background worker completion and cancellation

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{IgnorePattern, ScanConfig};
use crate::host::{MemorySource, Platform};
use crate::scan::*;

const KEYMAP: &str = "Default.sublime-keymap";

/// Helper: one-binding keymap
fn keymap(keys: &[&str], command: &str) -> String {
    let keys: Vec<String> = keys.iter().map(|k| format!("\"{}\"", k)).collect();
    format!(
        "[\n  // generated\n  {{ \"keys\": [{}], \"command\": \"{}\" }},\n]",
        keys.join(", "),
        command
    )
}

fn run(source: MemorySource, config: ScanConfig) -> ScanOutcome {
    Scanner::new(source, config).scan(&NoAlerts)
}

#[test]
fn test_keymap_file_selection() {
    assert!(is_keymap_file("Default.sublime-keymap", Platform::Linux));
    assert!(is_keymap_file("default.SUBLIME-KEYMAP", Platform::Linux));
    assert!(is_keymap_file("Default (Linux).sublime-keymap", Platform::Linux));
    assert!(is_keymap_file("Default (linux).sublime-keymap", Platform::Linux));
    assert!(is_keymap_file("Default (OSX).sublime-keymap", Platform::Osx));

    assert!(!is_keymap_file("Default (Windows).sublime-keymap", Platform::Linux));
    assert!(!is_keymap_file("Default (Amiga).sublime-keymap", Platform::Linux));
    assert!(!is_keymap_file("Vintage.sublime-keymap", Platform::Linux));
    assert!(!is_keymap_file("Default.sublime-keymap.bak", Platform::Linux));
    assert!(!is_keymap_file("Default.sublime-settings", Platform::Linux));
}

#[test]
fn test_processing_order() {
    let listed: Vec<String> = ["Alpha", "Default", "User", "Vintage", "Zeta"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let config = ScanConfig {
        ignored_packages: vec!["Vintage".into(), "Ghost".into()],
        ..ScanConfig::default()
    };

    let order = processing_order(&listed, &config);

    assert_eq!(order.packages, vec!["Default", "Alpha", "Zeta", "User"]);
    assert_eq!(order.unknown_ignored, vec!["Ghost"]);
}

#[test]
fn test_direct_conflict_end_to_end() {
    let source = MemorySource::new(Platform::Linux)
        .with_file("UserPkg", KEYMAP, keymap(&["c+ctrl"], "custom_copy"))
        .with_file("Default", KEYMAP, keymap(&["ctrl+c"], "copy"));

    let outcome = run(source, ScanConfig::default());

    let conflicts = outcome.detector.find_conflicts(false);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].key, "ctrl+c");
    assert_eq!(conflicts[0].entry.package_names(), vec!["Default", "UserPkg"]);
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.files_parsed, 2);
}

#[test]
fn test_overlap_end_to_end() {
    let content = r#"[
        { "keys": ["ctrl+k", "ctrl+c"], "command": "cmd1" },
        { "keys": ["ctrl+k"], "command": "cmd2" },
    ]"#;
    let source = MemorySource::new(Platform::Linux).with_file("Default", KEYMAP, content);

    let outcome = run(source, ScanConfig::default());
    let overlaps = outcome.detector.find_overlaps();

    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].prefix, "ctrl+k");
    assert_eq!(overlaps[0].extensions, vec!["ctrl+k,ctrl+c"]);
}

#[test]
fn test_platform_variant_merges_into_package() {
    let source = MemorySource::new(Platform::Osx)
        .with_file("Default", KEYMAP, keymap(&["super+c"], "copy"))
        .with_file("Default", "Default (OSX).sublime-keymap", keymap(&["super+c"], "osx_copy"))
        .with_file("Default", "Default (Windows).sublime-keymap", keymap(&["super+c"], "win_copy"))
        .with_file("Default", "Example.sublime-keymap", keymap(&["super+c"], "example"));

    let outcome = run(source, ScanConfig::default());
    let entry = outcome.detector.get("super+c").unwrap();

    assert_eq!(entry.package_names(), vec!["Default"]);
    assert_eq!(entry.packages["Default"].len(), 2);
    assert!(outcome.detector.find_conflicts(false).is_empty());
    assert_eq!(outcome.detector.find_conflicts(true).len(), 1);
}

#[test]
fn test_user_layer_processed_last() {
    let source = MemorySource::new(Platform::Linux)
        .with_file("User", KEYMAP, keymap(&["f5"], "user"))
        .with_file("Middle", KEYMAP, keymap(&["f5"], "middle"))
        .with_file("Default", KEYMAP, keymap(&["f5"], "base"));

    let outcome = run(source, ScanConfig::default());

    assert_eq!(outcome.packages, vec!["Default", "Middle", "User"]);
    assert_eq!(
        outcome.detector.get("f5").unwrap().package_names(),
        vec!["Default", "Middle", "User"]
    );
}

#[test]
fn test_ignore_patterns_and_packages() {
    let source = MemorySource::new(Platform::Linux)
        .with_file("Default", KEYMAP, keymap(&["ctrl+k"], "base"))
        .with_file("Other", KEYMAP, keymap(&["k+ctrl"], "other"))
        .with_file("Vintage", KEYMAP, keymap(&["escape"], "vi"));

    let config = ScanConfig {
        ignored_packages: vec!["Vintage".into(), "Missing".into()],
        ignore_patterns: vec![IgnorePattern::Joined("ctrl+k".into())],
        ..ScanConfig::default()
    };

    let outcome = run(source, config);

    assert!(outcome.detector.is_empty());
    assert_eq!(outcome.detector.ignored_count(), 2);
    assert!(!outcome.packages.contains(&"Vintage".to_string()));
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        &outcome.failures[0],
        ScanError::UnknownPackage(name) if name == "Missing"
    ));
}

#[test]
fn test_malformed_files_alert_once_and_scan_continues() {
    let source = MemorySource::new(Platform::Linux)
        .with_file("Broken", KEYMAP, "[{ \"keys\": [\"ctrl+b\"] ")
        .with_file("AlsoBroken", KEYMAP, "not json at all")
        .with_file("Healthy", KEYMAP, keymap(&["ctrl+h"], "help"));

    let alerts = RefCell::new(Vec::new());
    let sink = |message: &str| alerts.borrow_mut().push(message.to_string());

    let outcome = Scanner::new(source, ScanConfig::default()).scan(&sink);

    assert_eq!(alerts.borrow().len(), 1);
    assert!(alerts.borrow()[0].starts_with("Could not parse Broken/Default.sublime-keymap."));
    assert!(outcome.alerted);
    assert_eq!(outcome.decode_failures(), 2);
    assert!(outcome.detector.get("ctrl+h").is_some());
    assert_eq!(outcome.files_parsed, 1);
}

#[test]
fn test_broken_entry_skipped_but_file_indexed() {
    let content = r#"[
        { "command": "no_keys" },
        { "keys": ["ctrl+n"], "command": "new_file" }
    ]"#;
    let source = MemorySource::new(Platform::Linux).with_file("Default", KEYMAP, content);

    let outcome = run(source, ScanConfig::default());

    assert!(!outcome.alerted);
    assert_eq!(outcome.detector.total_bindings(), 1);
    assert!(matches!(outcome.failures[0], ScanError::Entry(_)));
}

#[test]
fn test_spawned_scan_delivers_outcome() {
    let source = MemorySource::new(Platform::Linux)
        .with_file("Default", KEYMAP, keymap(&["ctrl+c"], "copy"))
        .with_file("Other", KEYMAP, keymap(&["ctrl+c"], "other_copy"));

    let handle = spawn_scan(source, ScanConfig::default(), NoAlerts);
    let outcome = handle.wait(Duration::from_millis(5), |_| {}).unwrap();

    assert!(!outcome.cancelled);
    assert_eq!(outcome.detector.find_conflicts(false).len(), 1);
}

#[test]
fn test_poll_returns_outcome_once() {
    let source = MemorySource::new(Platform::Linux).with_file("Default", KEYMAP, keymap(&["a"], "x"));
    let mut handle = spawn_scan(source, ScanConfig::default(), NoAlerts);

    let mut outcome = None;
    for _ in 0..2000 {
        if let Some(done) = handle.poll() {
            outcome = Some(done);
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    assert!(outcome.is_some());
    assert!(handle.poll().is_none());
}

#[test]
fn test_cancel_before_first_file() {
    let source = MemorySource::new(Platform::Linux)
        .with_file("Default", KEYMAP, keymap(&["ctrl+c"], "copy"));
    let scanner = Scanner::new(source, ScanConfig::default());
    scanner.cancel_flag().store(true, Ordering::Relaxed);

    let outcome = scanner.scan(&NoAlerts);

    assert!(outcome.cancelled);
    assert!(outcome.detector.is_empty());
    assert_eq!(scanner.progress().load(Ordering::Relaxed), 0);
}

#[test]
fn test_threaded_alert_sink() {
    let alerts = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&alerts);
    let sink = move |message: &str| captured.lock().unwrap().push(message.to_string());

    let source = MemorySource::new(Platform::Linux).with_file("Broken", KEYMAP, "[,,]");
    let outcome = spawn_scan(source, ScanConfig::default(), sink)
        .wait(Duration::from_millis(5), |_| {})
        .unwrap();

    assert!(outcome.alerted);
    assert_eq!(alerts.lock().unwrap().len(), 1);
}

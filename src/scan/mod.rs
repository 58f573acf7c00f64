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

//! Package scanning
//!
//! The scanner walks every package through a `PackageSource`, parses each
//! applicable keymap file and feeds the bindings into a `ConflictDetector`.
//!
//! # Processing order
//! 1. The base layer (`Default`)
//! 2. Every other listed package, in listing order, minus ignored ones
//! 3. The user layer (`User`)
//!
//! Order does not change which conflicts exist; it decides which package is
//! listed first for a key.
//!
//! # Failures
//! Nothing stops a scan. Unreadable files, undecodable files and broken
//! entries are logged one by one and collected in `ScanOutcome::failures`.
//! The `AlertSink` is told about the first undecodable file only.

mod worker;

pub use worker::{spawn_scan, ScanHandle};

use chrono::{DateTime, Local};
use regex::Regex;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ScanConfig;
use crate::core::parser::parse_keymap_bytes;
use crate::core::{ConflictDetector, EntryError, ParseError};
use crate::host::{PackageSource, Platform};

/// Base layer, always processed first
pub const BASE_PACKAGE: &str = "Default";

/// User override layer, always processed last
pub const USER_PACKAGE: &str = "User";

/// `Default.sublime-keymap` or `Default (<Platform>).sublime-keymap`, any case
static KEYMAP_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^default(?: \(([a-z]+)\))?\.sublime-keymap$")
        .expect("keymap file pattern should be valid regex")
});

/// Errors recorded during a scan. None of them aborts the scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A keymap file could not be decoded; the file was skipped
    #[error(transparent)]
    Decode(#[from] ParseError),

    /// A binding entry was malformed; the entry was skipped
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// An ignored package name matched no installed package
    #[error("Ignored package '{0}' is not installed")]
    UnknownPackage(String),

    #[error("Failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },
}

/// Receives the user-facing alert raised for undecodable keymaps
pub trait AlertSink {
    fn alert(&self, message: &str);
}

impl<F: Fn(&str)> AlertSink for F {
    fn alert(&self, message: &str) {
        self(message)
    }
}

/// Sink that drops alerts; failures still land in the outcome and the log
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAlerts;

impl AlertSink for NoAlerts {
    fn alert(&self, _message: &str) {}
}

/// True when `file` is a keymap this index reads on `platform`.
pub fn is_keymap_file(file: &str, platform: Platform) -> bool {
    match KEYMAP_FILE.captures(file) {
        Some(captures) => captures
            .get(1)
            .map(|qualifier| qualifier.as_str().eq_ignore_ascii_case(platform.as_str()))
            .unwrap_or(true),
        None => false,
    }
}

/// Packages to scan, in processing order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackageOrder {
    pub packages: Vec<String>,

    /// Names from `ignored_packages` that were never listed
    pub unknown_ignored: Vec<String>,
}

/// Pull the base layer to the front and the user layer to the back.
pub fn processing_order(listed: &[String], config: &ScanConfig) -> PackageOrder {
    let is_listed = |name: &str| listed.iter().any(|p| p == name);
    let mut order = PackageOrder::default();

    if is_listed(BASE_PACKAGE) {
        order.packages.push(BASE_PACKAGE.to_string());
    }

    for package in listed {
        if package == BASE_PACKAGE || package == USER_PACKAGE {
            continue;
        }
        if config.is_package_ignored(package) {
            debug!("Skipping ignored package {}", package);
            continue;
        }
        if !order.packages.contains(package) {
            order.packages.push(package.clone());
        }
    }

    if is_listed(USER_PACKAGE) {
        order.packages.push(USER_PACKAGE.to_string());
    }

    order.unknown_ignored = config
        .ignored_packages
        .iter()
        .filter(|ignored| !is_listed(ignored.as_str()))
        .cloned()
        .collect();

    order
}

/// Everything a finished scan produced
#[derive(Debug)]
pub struct ScanOutcome {
    /// The built index, ready for queries
    pub detector: ConflictDetector,

    /// Every recovered failure, in the order it happened
    pub failures: Vec<ScanError>,

    /// Whether the alert sink was called
    pub alerted: bool,

    /// Packages in the order they were processed
    pub packages: Vec<String>,

    /// Keymap files successfully parsed
    pub files_parsed: usize,

    /// Stopped early through the cancel flag
    pub cancelled: bool,

    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl ScanOutcome {
    /// Number of keymap files that could not be decoded
    pub fn decode_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|failure| matches!(failure, ScanError::Decode(_)))
            .count()
    }
}

/// Builds a conflict index from every package of a source.
pub struct Scanner<S> {
    source: S,
    config: ScanConfig,
    cancel: Arc<AtomicBool>,
    progress: Arc<AtomicUsize>,
}

impl<S: PackageSource> Scanner<S> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self {
            source,
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Flag checked between files; setting it stops the scan early.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Counter of keymap files visited so far
    pub fn progress(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.progress)
    }

    /// Runs the whole scan synchronously.
    pub fn scan(&self, alerts: &dyn AlertSink) -> ScanOutcome {
        let started_at = Local::now();
        let timer = Instant::now();
        let platform = self.source.current_platform();

        let mut detector = ConflictDetector::with_rules(self.config.ignore_rules());
        let mut failures = Vec::new();
        let mut alerted = false;
        let mut files_parsed = 0;
        let mut cancelled = false;

        let listed = self.source.list_packages().unwrap_or_else(|source| {
            error!("Failed to list packages: {}", source);
            failures.push(ScanError::Io {
                location: "package list".to_string(),
                source,
            });
            Vec::new()
        });

        let order = processing_order(&listed, &self.config);
        for name in &order.unknown_ignored {
            warn!("Ignored package '{}' is not installed", name);
            failures.push(ScanError::UnknownPackage(name.clone()));
        }

        'packages: for package in &order.packages {
            let files = match self.source.list_package_files(package) {
                Ok(files) => files,
                Err(source) => {
                    error!("Failed to list files of {}: {}", package, source);
                    failures.push(ScanError::Io {
                        location: package.clone(),
                        source,
                    });
                    continue;
                }
            };

            for file in files.iter().filter(|file| is_keymap_file(file, platform)) {
                if self.cancel.load(Ordering::Relaxed) {
                    info!("Scan cancelled before {}/{}", package, file);
                    cancelled = true;
                    break 'packages;
                }
                self.progress.fetch_add(1, Ordering::Relaxed);

                let location = format!("{}/{}", package, file);
                let bytes = match self.source.read_file(package, file) {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => {
                        debug!("{} disappeared before it could be read", location);
                        continue;
                    }
                    Err(source) => {
                        error!("Failed to read {}: {}", location, source);
                        failures.push(ScanError::Io { location, source });
                        continue;
                    }
                };

                let keymap = match parse_keymap_bytes(&bytes, &location) {
                    Ok(keymap) => keymap,
                    Err(e) => {
                        error!("{}", e);
                        if !alerted {
                            alerts.alert(&format!(
                                "Could not parse {}. Bindings from broken keymaps are missing from the report; see the log for every failure.",
                                e.file()
                            ));
                            alerted = true;
                        }
                        failures.push(ScanError::Decode(e));
                        continue;
                    }
                };

                debug!("{}: {} bindings", location, keymap.bindings.len());
                files_parsed += 1;

                for skipped in keymap.skipped {
                    warn!("{}", skipped);
                    failures.push(ScanError::Entry(skipped));
                }

                for binding in keymap.bindings {
                    detector.add_binding(package, binding);
                }
            }
        }

        let elapsed = timer.elapsed();
        info!(
            "Indexed {} bindings under {} keys from {} files in {:?} ({} ignored, {} failures)",
            detector.total_bindings(),
            detector.len(),
            files_parsed,
            elapsed,
            detector.ignored_count(),
            failures.len(),
        );

        ScanOutcome {
            detector,
            failures,
            alerted,
            packages: order.packages,
            files_parsed,
            cancelled,
            started_at,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests;

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

//! Packages directory watcher
//!
//! Uses OS-level file watching via the notify crate so `--watch` can
//! re-run the scan whenever a keymap is created, changed or removed.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;
use tracing::warn;

/// Watches a packages directory for keymap changes
pub struct KeymapWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

/// True for paths ending in `.sublime-keymap`, any case
pub fn is_keymap_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sublime-keymap"))
}

fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|path| is_keymap_path(path))
}

impl KeymapWatcher {
    pub fn new(root: PathBuf) -> notify::Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok(KeymapWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drains pending events (non-blocking); true if any keymap changed.
    pub fn check_for_changes(&self) -> bool {
        let mut changed = false;
        while let Ok(event_result) = self.rx.try_recv() {
            match event_result {
                Ok(event) => changed |= is_relevant(&event),
                Err(e) => warn!("Watch error: {}", e),
            }
        }
        changed
    }

    /// Blocks until a keymap changes, then waits `settle` and drains the
    /// burst of events an editor save usually produces.
    ///
    /// Returns false once the watcher is gone.
    pub fn wait_for_change(&self, settle: Duration) -> bool {
        loop {
            match self.rx.recv() {
                Ok(Ok(event)) if is_relevant(&event) => {
                    std::thread::sleep(settle);
                    self.check_for_changes();
                    return true;
                }
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => warn!("Watch error: {}", e),
                Err(_) => return false,
            }
        }
    }
}

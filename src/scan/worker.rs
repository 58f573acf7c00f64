//! Background scanning
//!
//! One worker thread runs the whole scan. The caller keeps control and
//! either polls (`ScanHandle::poll`) or waits with a periodic tick
//! (`ScanHandle::wait`) to animate a progress indicator. The index is only
//! handed over once the worker is done, so no locking is involved.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::ScanConfig;
use crate::host::PackageSource;
use crate::scan::{AlertSink, ScanOutcome, Scanner};

/// Handle to a scan running on a worker thread
pub struct ScanHandle {
    rx: Receiver<ScanOutcome>,
    cancel: Arc<AtomicBool>,
    progress: Arc<AtomicUsize>,
    thread: Option<JoinHandle<()>>,
}

/// Starts a scan on a new thread.
///
/// # Example
///
/// ```no_run
/// use find_key_conflicts::config::ScanConfig;
/// use find_key_conflicts::host::{DirectorySource, Platform};
/// use find_key_conflicts::scan::{spawn_scan, NoAlerts};
/// use std::time::Duration;
///
/// let source = DirectorySource::new("/tmp/Packages".into(), Platform::current());
/// let handle = spawn_scan(source, ScanConfig::default(), NoAlerts);
/// let outcome = handle.wait(Duration::from_millis(100), |_| {});
/// # let _ = outcome;
/// ```
pub fn spawn_scan<S, A>(source: S, config: ScanConfig, alerts: A) -> ScanHandle
where
    S: PackageSource + Send + 'static,
    A: AlertSink + Send + 'static,
{
    let (tx, rx) = channel();
    let scanner = Scanner::new(source, config);
    let cancel = scanner.cancel_flag();
    let progress = scanner.progress();

    let thread = thread::spawn(move || {
        let outcome = scanner.scan(&alerts);
        // Receiver may be gone if the caller lost interest
        let _ = tx.send(outcome);
    });

    ScanHandle {
        rx,
        cancel,
        progress,
        thread: Some(thread),
    }
}

impl ScanHandle {
    /// Checks for completion (non-blocking)
    ///
    /// Returns the outcome exactly once; later calls return `None`.
    pub fn poll(&mut self) -> Option<ScanOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.join();
                Some(outcome)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks until the scan is done, calling `on_tick` every `interval`
    /// with the number of files visited so far.
    ///
    /// Returns `None` only if the worker died without reporting.
    pub fn wait(mut self, interval: Duration, mut on_tick: impl FnMut(usize)) -> Option<ScanOutcome> {
        loop {
            match self.rx.recv_timeout(interval) {
                Ok(outcome) => {
                    self.join();
                    return Some(outcome);
                }
                Err(RecvTimeoutError::Timeout) => on_tick(self.files_visited()),
                Err(RecvTimeoutError::Disconnected) => {
                    self.join();
                    return None;
                }
            }
        }
    }

    /// Asks the worker to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn files_visited(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Scan worker panicked");
            }
        }
    }
}

//! Download progress: a shared byte counter plus a background reporter.
//!
//! All writers of one download add to the same [`ProgressState`] with atomic
//! increments. A [`ProgressReporter`] thread samples it on a fixed tick and
//! hands snapshots to a [`ProgressSink`].

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Bytes written so far and the known total (0 = unknown).
#[derive(Debug, Default)]
pub struct ProgressState {
    written: AtomicU64,
    total: AtomicU64,
}

impl ProgressState {
    /// New counter starting at `initial` bytes (non-zero when resuming).
    pub fn new(total: Option<u64>, initial: u64) -> Self {
        Self {
            written: AtomicU64::new(initial),
            total: AtomicU64::new(total.unwrap_or(0)),
        }
    }

    pub fn add(&self, n: u64) {
        self.written.fetch_add(n, Ordering::Relaxed);
    }

    /// Record the total once it becomes known (e.g. from `Content-Length`).
    pub fn set_total_if_unknown(&self, total: u64) {
        let _ = self
            .total
            .compare_exchange(0, total, Ordering::Relaxed, Ordering::Relaxed);
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Current values, with `written` clamped to the known total.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let total = match self.total.load(Ordering::Relaxed) {
            0 => None,
            t => Some(t),
        };
        let written = self.written.load(Ordering::Relaxed);
        ProgressSnapshot {
            written: total.map_or(written, |t| written.min(t)),
            total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub written: u64,
    pub total: Option<u64>,
}

impl ProgressSnapshot {
    /// Percentage in [0, 100]; `None` while the total is unknown.
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(t) if t > 0 => Some(self.written.min(t) as f64 * 100.0 / t as f64),
            _ => None,
        }
    }
}

/// Receives progress snapshots from the reporter thread.
pub trait ProgressSink: Send + Sync {
    /// Called on every tick while the transfer runs.
    fn update(&self, snapshot: ProgressSnapshot);
    /// Called exactly once after the transfer ends, successful or not.
    fn finish(&self, snapshot: ProgressSnapshot);
}

/// Prints `download progress: NN.NN%` on one rewritten stdout line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn print(snapshot: &ProgressSnapshot) {
        if let Some(pct) = snapshot.percent() {
            let mut out = std::io::stdout().lock();
            let _ = write!(out, "\rdownload progress: {:.2}%", pct);
            let _ = out.flush();
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&self, snapshot: ProgressSnapshot) {
        Self::print(&snapshot);
    }

    fn finish(&self, snapshot: ProgressSnapshot) {
        if snapshot.percent().is_some() {
            Self::print(&snapshot);
            println!();
        }
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _: ProgressSnapshot) {}
    fn finish(&self, _: ProgressSnapshot) {}
}

/// Background ticker for one transfer. `stop` may be called from any number
/// of code paths; only the first call has an effect. Dropping stops it too.
pub struct ProgressReporter {
    stop_tx: Mutex<Option<mpsc::Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressReporter {
    /// Emit an initial snapshot and start ticking every `interval`.
    pub fn start(
        state: Arc<ProgressState>,
        sink: Arc<dyn ProgressSink>,
        interval: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        sink.update(state.snapshot());
        let handle = std::thread::Builder::new()
            .name("vdl-progress".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => sink.update(state.snapshot()),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        sink.finish(state.snapshot());
                        return;
                    }
                }
            });
        let handle = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!(error = %e, "could not spawn progress reporter");
                None
            }
        };
        Self {
            stop_tx: Mutex::new(Some(stop_tx)),
            handle: Mutex::new(handle),
        }
    }

    /// Stop ticking and wait for the final flush. Idempotent.
    pub fn stop(&self) {
        let tx = self.stop_tx.lock().ok().and_then(|mut g| g.take());
        let Some(tx) = tx else {
            return;
        };
        drop(tx);
        let handle = self.handle.lock().ok().and_then(|mut g| g.take());
        if let Some(h) = handle {
            let _ = h.join();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Recording {
        updates: Mutex<Vec<ProgressSnapshot>>,
        finishes: AtomicUsize,
    }

    impl ProgressSink for Recording {
        fn update(&self, s: ProgressSnapshot) {
            self.updates.lock().unwrap().push(s);
        }
        fn finish(&self, s: ProgressSnapshot) {
            self.updates.lock().unwrap().push(s);
            self.finishes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn snapshot_clamps_to_total() {
        let state = ProgressState::new(Some(10), 0);
        state.add(15);
        assert_eq!(state.snapshot().written, 10);
        assert_eq!(state.snapshot().percent(), Some(100.0));
    }

    #[test]
    fn unknown_total_has_no_percent() {
        let state = ProgressState::new(None, 5);
        assert_eq!(state.snapshot().percent(), None);
        state.set_total_if_unknown(20);
        assert_eq!(state.snapshot().percent(), Some(25.0));
        state.set_total_if_unknown(40);
        assert_eq!(state.snapshot().total, Some(20));
    }

    #[test]
    fn resume_starts_from_initial_offset() {
        let state = ProgressState::new(Some(100), 40);
        assert_eq!(state.written(), 40);
    }

    #[test]
    fn stop_is_idempotent_and_finishes_once() {
        let state = Arc::new(ProgressState::new(Some(100), 0));
        let sink = Arc::new(Recording::default());
        let reporter =
            ProgressReporter::start(Arc::clone(&state), sink.clone(), Duration::from_millis(5));
        for _ in 0..10 {
            state.add(10);
            std::thread::sleep(Duration::from_millis(2));
        }
        reporter.stop();
        reporter.stop();
        drop(reporter);
        assert_eq!(sink.finishes.load(Ordering::SeqCst), 1);

        let updates = sink.updates.lock().unwrap();
        assert!(updates.windows(2).all(|w| w[0].written <= w[1].written));
        assert_eq!(updates.last().unwrap().written, 100);
    }
}

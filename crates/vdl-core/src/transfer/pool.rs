//! Bounded worker pool for chunk transfers.
//!
//! Runs every item on at most `workers` threads, joins them all, and returns
//! the failures in the order they were collected.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::DownloadError;

/// What happens to sibling chunks once one chunk fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkFailurePolicy {
    /// Every launched chunk runs to its own completion or failure.
    #[default]
    WaitAll,
    /// Raise the shared cancel flag: in-flight siblings abort, queued ones never start.
    CancelSiblings,
}

/// Default worker count: one per chunk, capped by available parallelism.
pub fn default_workers(items: usize) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    items.min(cpus).max(1)
}

/// Runs `work(index, item)` for every item and returns `(index, error)` for
/// each failure, in collection order. Items left in the queue after `cancel`
/// is raised are skipped without being reported.
pub fn run_pool<T, F>(
    items: Vec<T>,
    workers: usize,
    policy: ChunkFailurePolicy,
    cancel: &AtomicBool,
    work: F,
) -> Vec<(usize, DownloadError)>
where
    T: Send,
    F: Fn(usize, T) -> Result<(), DownloadError> + Sync,
{
    let count = items.len();
    if count == 0 {
        return Vec::new();
    }
    let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
    let (tx, rx) = mpsc::channel();
    let workers = workers.clamp(1, count);

    std::thread::scope(|s| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let work = &work;
            s.spawn(move || loop {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                let next = queue.lock().ok().and_then(|mut q| q.pop_front());
                let Some((index, item)) = next else {
                    break;
                };
                let res = panic::catch_unwind(AssertUnwindSafe(|| work(index, item)))
                    .unwrap_or_else(|_| Err(DownloadError::WorkerPanicked));
                if res.is_err() && policy == ChunkFailurePolicy::CancelSiblings {
                    cancel.store(true, Ordering::Relaxed);
                }
                if tx.send((index, res)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        rx.into_iter()
            .filter_map(|(index, res)| res.err().map(|e| (index, e)))
            .collect()
    })
}

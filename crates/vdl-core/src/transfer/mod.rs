//! Chunked transfer executor.
//!
//! Runs a [`TransferPlan`] against the `.part` staging file: one stream for
//! full and resumed downloads, or a bounded pool of ranged requests writing
//! disjoint byte ranges of a presized file. The executor never retries.

mod chunk;
mod handler;
mod pool;
mod stream;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use curl::easy::{Easy2, Handler};

use crate::error::DownloadError;
use crate::plan::TransferPlan;
use crate::progress::ProgressState;
use crate::storage::StorageWriterBuilder;

pub use pool::{default_workers, run_pool, ChunkFailurePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Whole-request ceiling; bounds worst-case hangs.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub failure_policy: ChunkFailurePolicy,
    /// Chunk workers; `None` = `min(chunks, available_parallelism)`.
    pub max_workers: Option<usize>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30 * 60),
            connect_timeout: Duration::from_secs(30),
            failure_policy: ChunkFailurePolicy::WaitAll,
            max_workers: None,
        }
    }
}

fn configure<H: Handler>(easy: &mut Easy2<H>, url: &str, opts: &TransferOptions) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.request_timeout)?;
    // Enables the progress callback, which is where cancellation is observed.
    easy.progress(true)?;
    Ok(())
}

/// Executes `plan`, writing into `part`. `known_total` is the probed size, if
/// any. Returns the bytes received by this call (excluding resumed bytes).
pub fn execute(
    url: &str,
    plan: &TransferPlan,
    part: &Path,
    known_total: Option<u64>,
    opts: &TransferOptions,
    progress: &Arc<ProgressState>,
) -> Result<u64, DownloadError> {
    match plan {
        TransferPlan::FullSequential => {
            stream::download_stream(url, part, 0, known_total, opts, progress)
        }
        TransferPlan::ResumeFromOffset { offset, total } => {
            stream::download_stream(url, part, *offset, Some(*total), opts, progress)
        }
        TransferPlan::ConcurrentChunks { total, chunks } => {
            let mut builder = StorageWriterBuilder::create(part)?;
            builder.preallocate(*total)?;
            let storage = builder.build();

            let cancel = Arc::new(AtomicBool::new(false));
            let workers = opts
                .max_workers
                .unwrap_or_else(|| default_workers(chunks.len()));
            tracing::debug!(url, chunks = chunks.len(), workers, "starting concurrent chunks");

            let failures = run_pool(chunks.clone(), workers, opts.failure_policy, &cancel, |index, c| {
                let received = chunk::download_chunk(url, c, &storage, opts, progress, &cancel)?;
                tracing::debug!(index, start = c.start, received, "chunk finished");
                Ok(())
            });

            let mut failures = failures.into_iter();
            if let Some((index, first)) = failures.next() {
                for (other, e) in failures {
                    tracing::debug!(index = other, error = %e, "additional chunk failure");
                }
                return Err(DownloadError::Chunk {
                    index,
                    source: Box::new(first),
                });
            }
            storage.sync()?;
            Ok(*total)
        }
    }
}

//! One chunk of a concurrent download: ranged GET written at the chunk's
//! absolute offsets.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use curl::easy::Easy2;

use super::handler::{self, Expect, RangeWriter};
use super::TransferOptions;
use crate::error::DownloadError;
use crate::plan::Chunk;
use crate::progress::ProgressState;
use crate::storage::StorageWriter;

/// Fetches `chunk` with its own curl handle. Requires 206; any other status,
/// a short body or bytes past the chunk end fail this chunk.
pub(crate) fn download_chunk(
    url: &str,
    chunk: Chunk,
    storage: &StorageWriter,
    opts: &TransferOptions,
    progress: &Arc<ProgressState>,
    cancel: &Arc<AtomicBool>,
) -> Result<u64, DownloadError> {
    let writer = RangeWriter::new(
        storage.clone(),
        Expect::Partial { start: chunk.start },
        chunk.start,
        Some(chunk.end),
        Arc::clone(progress),
        Some(Arc::clone(cancel)),
    );
    let mut easy = Easy2::new(writer);
    super::configure(&mut easy, url, opts).map_err(DownloadError::Transport)?;
    easy.range(&chunk.curl_range())
        .map_err(DownloadError::Transport)?;
    handler::perform(&mut easy)
}

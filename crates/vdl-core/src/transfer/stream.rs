//! Single-stream transfer: a fresh full GET or a ranged resume of an
//! existing staging file.

use std::path::Path;
use std::sync::Arc;

use curl::easy::Easy2;

use super::handler::{self, Expect, RangeWriter};
use super::TransferOptions;
use crate::error::DownloadError;
use crate::progress::ProgressState;
use crate::storage::{StorageWriter, StorageWriterBuilder};

/// Downloads `url` into `part` starting at byte `start`.
///
/// `start == 0` truncates the staging file and sends no `Range` header.
/// `start > 0` keeps the existing bytes and requests `bytes=start-(total-1)`
/// (or the open-ended `bytes=start-` when the total is unknown); a reply other
/// than 206 is a `RangeNotHonored` error, never silently appended.
/// Returns the number of bytes received by this request.
pub(crate) fn download_stream(
    url: &str,
    part: &Path,
    start: u64,
    total: Option<u64>,
    opts: &TransferOptions,
    progress: &Arc<ProgressState>,
) -> Result<u64, DownloadError> {
    let storage = if start == 0 {
        StorageWriterBuilder::create(part)?.build()
    } else {
        StorageWriter::open_existing(part)?
    };

    let expect = if start == 0 {
        Expect::Success
    } else {
        Expect::Partial { start }
    };
    let writer = RangeWriter::new(
        storage.clone(),
        expect,
        start,
        total,
        Arc::clone(progress),
        None,
    );
    let mut easy = Easy2::new(writer);
    super::configure(&mut easy, url, opts).map_err(DownloadError::Transport)?;
    if start > 0 {
        let range = match total {
            Some(t) => format!("{}-{}", start, t.saturating_sub(1)),
            None => format!("{}-", start),
        };
        easy.range(&range).map_err(DownloadError::Transport)?;
    }

    let received = handler::perform(&mut easy)?;
    storage.sync()?;
    tracing::debug!(url, start, received, "single stream finished");
    Ok(received)
}

//! curl Handler that validates the response before writing body bytes at
//! absolute offsets of the staging file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use curl::easy::{Easy2, Handler, WriteError};

use crate::error::DownloadError;
use crate::probe::parse::{header_value, parse_content_range, parse_http_status, push_header_line};
use crate::progress::ProgressState;
use crate::storage::StorageWriter;

/// What a response must look like before any of its body is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expect {
    /// Unranged request: any 2xx.
    Success,
    /// Ranged request: 206, and a `Content-Range` (if sent) starting at `start`.
    Partial { start: u64 },
}

pub(crate) struct RangeWriter {
    storage: StorageWriter,
    expect: Expect,
    begin: u64,
    /// Absolute offset of the next write.
    cursor: u64,
    /// Exclusive end; bytes past it are refused.
    limit: Option<u64>,
    progress: Arc<ProgressState>,
    cancel: Option<Arc<AtomicBool>>,
    headers: Vec<String>,
    checked: bool,
    failure: Option<DownloadError>,
}

impl RangeWriter {
    pub(crate) fn new(
        storage: StorageWriter,
        expect: Expect,
        start: u64,
        limit: Option<u64>,
        progress: Arc<ProgressState>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            storage,
            expect,
            begin: start,
            cursor: start,
            limit,
            progress,
            cancel,
            headers: Vec::new(),
            checked: false,
            failure: None,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn check_response(&mut self) -> Result<(), DownloadError> {
        let status = parse_http_status(&self.headers).unwrap_or(0);
        match self.expect {
            Expect::Success => {
                if !(200..300).contains(&status) {
                    return Err(DownloadError::HttpStatus(status));
                }
                let len = header_value(&self.headers, "content-length")
                    .and_then(|v| v.parse::<u64>().ok());
                if let Some(len) = len {
                    self.progress.set_total_if_unknown(self.begin + len);
                }
            }
            Expect::Partial { start } => {
                if status != 206 {
                    return Err(DownloadError::RangeNotHonored { status });
                }
                if let Some(raw) = header_value(&self.headers, "content-range") {
                    let ok = parse_content_range(raw).map(|cr| cr.start == start);
                    if ok != Some(true) {
                        return Err(DownloadError::UnexpectedContentRange {
                            expected_start: start,
                            got: Some(raw.to_string()),
                        });
                    }
                }
            }
        }
        self.checked = true;
        Ok(())
    }

    /// Bytes written by this request.
    pub(crate) fn received(&self) -> u64 {
        self.cursor - self.begin
    }
}

impl Handler for RangeWriter {
    fn header(&mut self, data: &[u8]) -> bool {
        push_header_line(&mut self.headers, data);
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        if !self.checked {
            if let Err(e) = self.check_response() {
                self.failure = Some(e);
                return Ok(0);
            }
        }
        let n = data.len() as u64;
        if let Some(limit) = self.limit {
            if self.cursor + n > limit {
                self.failure = Some(DownloadError::Overrun { limit });
                return Ok(0);
            }
        }
        if let Err(e) = self.storage.write_at(self.cursor, data) {
            self.failure = Some(DownloadError::storage(self.storage.temp_path(), e));
            return Ok(0);
        }
        self.cursor += n;
        self.progress.add(n);
        Ok(data.len())
    }

    fn progress(&mut self, _dltotal: f64, _dlnow: f64, _ultotal: f64, _ulnow: f64) -> bool {
        !self.cancelled()
    }
}

/// Performs the request and turns every way it can go wrong into a typed
/// error. Returns the number of bytes written.
pub(crate) fn perform(easy: &mut Easy2<RangeWriter>) -> Result<u64, DownloadError> {
    let result = easy.perform();
    let writer = easy.get_mut();
    if let Some(failure) = writer.failure.take() {
        return Err(failure);
    }
    if let Err(e) = result {
        if e.is_aborted_by_callback() && writer.cancelled() {
            return Err(DownloadError::Cancelled);
        }
        return Err(DownloadError::Transport(e));
    }
    if !writer.checked {
        // Empty body: the write callback never ran.
        writer.check_response()?;
    }
    if let Some(limit) = writer.limit {
        if writer.cursor != limit {
            return Err(DownloadError::ShortTransfer {
                expected: limit - writer.begin,
                received: writer.received(),
            });
        }
    }
    Ok(writer.received())
}

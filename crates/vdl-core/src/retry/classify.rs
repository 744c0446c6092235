//! Classify download errors into retry policy error kinds.

use super::policy::ErrorKind;
use crate::error::DownloadError;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    if e.is_partial_file() {
        return ErrorKind::Interrupted;
    }
    ErrorKind::Other
}

/// Classify a download error into an ErrorKind.
pub fn classify(e: &DownloadError) -> ErrorKind {
    match e {
        DownloadError::Probe { source, .. } | DownloadError::Transport(source) => {
            classify_curl_error(source)
        }
        DownloadError::HttpStatus(code) => classify_http_status(*code),
        DownloadError::RangeNotHonored { status } if *status != 200 && *status != 206 => {
            classify_http_status(*status)
        }
        DownloadError::RangeNotHonored { .. }
        | DownloadError::UnexpectedContentRange { .. }
        | DownloadError::ShortTransfer { .. } => ErrorKind::Interrupted,
        DownloadError::Chunk { source, .. } => classify(source),
        DownloadError::InvalidUrl { .. }
        | DownloadError::Overrun { .. }
        | DownloadError::Storage { .. }
        | DownloadError::Cancelled
        | DownloadError::WorkerPanicked
        | DownloadError::Verify { .. }
        | DownloadError::DigestMismatch { .. }
        | DownloadError::Promote { .. } => ErrorKind::Other,
    }
}

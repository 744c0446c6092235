//! Typed download errors, tagged with the stage that produced them.

use std::path::PathBuf;

/// Pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request validation before any I/O.
    Input,
    /// Remote size / range-capability probe.
    Probe,
    /// Byte transfer into the `.part` staging file.
    Transfer,
    /// Digest comparison of the completed file.
    Verification,
    /// Rename of `.part` to the destination.
    Promote,
}

/// Error returned by a download attempt. No partially written destination
/// is ever left behind when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("probe of {url} failed: {source}")]
    Probe {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("transfer failed: {0}")]
    Transport(#[source] curl::Error),

    #[error("server returned HTTP {0}")]
    HttpStatus(u32),

    /// A ranged request was answered with something other than 206.
    #[error("server did not honor range request (HTTP {status})")]
    RangeNotHonored { status: u32 },

    #[error("unexpected Content-Range: wanted start {expected_start}, got {got:?}")]
    UnexpectedContentRange { expected_start: u64, got: Option<String> },

    /// Server sent more bytes than the requested range holds.
    #[error("server sent data past byte {limit}")]
    Overrun { limit: u64 },

    #[error("partial transfer: expected {expected} bytes, got {received}")]
    ShortTransfer { expected: u64, received: u64 },

    #[error("storage error on {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chunk {index} failed: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: Box<DownloadError>,
    },

    #[error("transfer cancelled")]
    Cancelled,

    #[error("download worker panicked")]
    WorkerPanicked,

    /// The file could not be hashed.
    #[error("could not verify {}: {source}", path.display())]
    Verify {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download verification failed: expected sha256 {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("failed to rename {} to {}: {source}", from.display(), to.display())]
    Promote {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Stage of the pipeline this error came from.
    pub fn stage(&self) -> Stage {
        match self {
            DownloadError::InvalidUrl { .. } => Stage::Input,
            DownloadError::Probe { .. } => Stage::Probe,
            DownloadError::Transport(_)
            | DownloadError::HttpStatus(_)
            | DownloadError::RangeNotHonored { .. }
            | DownloadError::UnexpectedContentRange { .. }
            | DownloadError::Overrun { .. }
            | DownloadError::ShortTransfer { .. }
            | DownloadError::Storage { .. }
            | DownloadError::Chunk { .. }
            | DownloadError::Cancelled
            | DownloadError::WorkerPanicked => Stage::Transfer,
            DownloadError::Verify { .. } | DownloadError::DigestMismatch { .. } => {
                Stage::Verification
            }
            DownloadError::Promote { .. } => Stage::Promote,
        }
    }
}

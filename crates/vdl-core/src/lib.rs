pub mod config;
pub mod logging;

pub mod checksum;
pub mod download;
pub mod error;
pub mod plan;
pub mod probe;
pub mod progress;
pub mod retry;
pub mod storage;
pub mod transfer;
pub mod url_model;

pub use download::{download, DownloadOptions, DownloadOutcome, DownloadRequest, Downloader};
pub use error::{DownloadError, Stage};

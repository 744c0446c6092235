//! Download orchestration: verify, probe, plan, transfer, verify, promote.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::checksum::{self, DigestCheck};
use crate::error::DownloadError;
use crate::plan::{self, PlanOptions, Strategy, TransferPlan};
use crate::probe::{self, ProbeOptions};
use crate::progress::{ConsoleProgress, ProgressReporter, ProgressSink, ProgressState};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::storage;
use crate::transfer::{self, TransferOptions};
use crate::url_model;

/// Everything a [`Downloader`] needs, resolved once (usually from config).
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub plan: PlanOptions,
    pub transfer: TransferOptions,
    pub probe: ProbeOptions,
    pub progress_interval: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            plan: PlanOptions::default(),
            transfer: TransferOptions::default(),
            probe: ProbeOptions::default(),
            progress_interval: Duration::from_millis(200),
        }
    }
}

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
    /// Lowercase or uppercase hex SHA-256; `None` accepts any content.
    pub expected_digest: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            expected_digest: None,
        }
    }

    /// Empty or blank digests mean "no verification".
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        let digest = digest.into().trim().to_string();
        self.expected_digest = (!digest.is_empty()).then_some(digest);
        self
    }

    fn digest(&self) -> Option<&str> {
        self.expected_digest.as_deref()
    }
}

/// How a successful download was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The destination already matched the digest; nothing was fetched.
    AlreadyPresent,
    /// A complete `.part` from an earlier run matched and was promoted.
    PromotedStaged,
    /// Bytes were fetched with `strategy`; `bytes` excludes resumed bytes.
    Transferred { strategy: Strategy, bytes: u64 },
}

/// Fetches files over HTTP(S) into verified destinations.
pub struct Downloader {
    opts: DownloadOptions,
    sink: Arc<dyn ProgressSink>,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new(DownloadOptions::default())
    }
}

impl Downloader {
    /// Downloader reporting progress to stdout.
    pub fn new(opts: DownloadOptions) -> Self {
        Self {
            opts,
            sink: Arc::new(ConsoleProgress),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.opts
    }

    /// Produce `req.destination`, verified against `req.expected_digest`.
    ///
    /// The destination is only ever created by renaming a verified `.part`.
    /// Calling this again after success is free when a digest is given.
    pub fn download(&self, req: &DownloadRequest) -> Result<DownloadOutcome, DownloadError> {
        let url = url_model::validate_url(&req.url)?;
        let dest = req.destination.as_path();
        let part = storage::temp_path(dest);

        if let Some(expected) = req.digest() {
            if verify_file(dest, expected)?.is_satisfied() {
                tracing::info!(dest = %dest.display(), "destination already verified");
                return Ok(DownloadOutcome::AlreadyPresent);
            }
            if verify_file(&part, expected)?.is_satisfied() {
                tracing::info!(part = %part.display(), "staged file already complete, promoting");
                storage::promote(&part, dest)?;
                return Ok(DownloadOutcome::PromotedStaged);
            }
        }
        storage::remove_if_exists(dest).map_err(|e| DownloadError::storage(dest, e))?;

        let remote = probe::probe(url.as_str(), &self.opts.probe)?;
        let part_len = storage::existing_len(&part)?;
        let plan = plan::select_plan(&remote, part_len, &self.opts.plan);
        tracing::debug!(
            url = %url,
            total = ?remote.total_size,
            ranges = remote.supports_ranges,
            part_len,
            plan = %plan,
            "selected transfer plan"
        );

        let initial = match plan {
            TransferPlan::ResumeFromOffset { offset, .. } => offset,
            _ => 0,
        };
        let progress = Arc::new(ProgressState::new(remote.total_size, initial));
        let reporter = ProgressReporter::start(
            Arc::clone(&progress),
            Arc::clone(&self.sink),
            self.opts.progress_interval,
        );
        let result = transfer::execute(
            url.as_str(),
            &plan,
            &part,
            remote.total_size,
            &self.opts.transfer,
            &progress,
        );
        reporter.stop();

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                if matches!(plan, TransferPlan::ResumeFromOffset { .. }) && is_range_violation(&e) {
                    tracing::warn!(part = %part.display(), error = %e, "server broke resume, discarding staged bytes");
                    discard(&part);
                }
                return Err(e);
            }
        };

        match verify_file(&part, req.digest().unwrap_or_default()) {
            Ok(DigestCheck::Mismatch { actual }) => {
                discard(&part);
                return Err(DownloadError::DigestMismatch {
                    expected: req.digest().unwrap_or_default().to_ascii_lowercase(),
                    actual,
                });
            }
            Ok(DigestCheck::Missing) => {
                discard(&part);
                return Err(DownloadError::DigestMismatch {
                    expected: req.digest().unwrap_or_default().to_ascii_lowercase(),
                    actual: String::new(),
                });
            }
            Ok(DigestCheck::Skipped | DigestCheck::Match) => {}
            Err(e) => {
                discard(&part);
                return Err(e);
            }
        }

        storage::promote(&part, dest)?;
        tracing::info!(url = %url, dest = %dest.display(), bytes, plan = %plan, "download complete");
        Ok(DownloadOutcome::Transferred {
            strategy: plan.strategy(),
            bytes,
        })
    }

    /// [`download`](Self::download), re-invoked on retryable failures.
    pub fn download_with_retry(
        &self,
        req: &DownloadRequest,
        policy: &RetryPolicy,
    ) -> Result<DownloadOutcome, DownloadError> {
        run_with_retry(policy, |attempt| {
            if attempt > 1 {
                tracing::info!(url = %req.url, attempt, "retrying download");
            }
            self.download(req)
        })
    }
}

/// Download `url` to `destination` with default options and console progress.
pub fn download(
    url: &str,
    destination: impl Into<PathBuf>,
    expected_sha256: Option<&str>,
) -> Result<DownloadOutcome, DownloadError> {
    let mut req = DownloadRequest::new(url, destination);
    if let Some(d) = expected_sha256 {
        req = req.with_sha256(d);
    }
    Downloader::default().download(&req)
}

fn verify_file(path: &Path, expected: &str) -> Result<DigestCheck, DownloadError> {
    checksum::check(path, Some(expected)).map_err(|e| DownloadError::Verify {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, format!("{:#}", e)),
    })
}

fn is_range_violation(e: &DownloadError) -> bool {
    matches!(
        e,
        DownloadError::RangeNotHonored { .. } | DownloadError::UnexpectedContentRange { .. }
    )
}

fn discard(part: &Path) {
    if let Err(e) = storage::remove_if_exists(part) {
        tracing::warn!(part = %part.display(), error = %e, "could not remove staging file");
    }
}

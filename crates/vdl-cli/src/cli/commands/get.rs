//! `vdl get <url>`: download, resume and verify one file.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use vdl_core::config::VdlConfig;
use vdl_core::progress::NoProgress;
use vdl_core::retry::RetryPolicy;
use vdl_core::url_model;
use vdl_core::{DownloadOutcome, DownloadRequest, Downloader};

pub struct GetArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub sha256: Option<String>,
    pub retries: Option<u32>,
    pub quiet: bool,
}

pub async fn run_get(cfg: &VdlConfig, args: GetArgs) -> Result<()> {
    let url = url_model::validate_url(&args.url)?;
    let dest = match args.output {
        Some(p) => p,
        None => url_model::default_destination(&url, &std::env::current_dir()?),
    };

    let mut req = DownloadRequest::new(url.as_str(), &dest);
    if let Some(d) = &args.sha256 {
        req = req.with_sha256(d.as_str());
    }

    let mut policy = cfg.retry_policy();
    if let Some(n) = args.retries {
        policy = RetryPolicy {
            max_attempts: n.saturating_add(1),
            ..policy
        };
    }

    let mut downloader = Downloader::new(cfg.download_options());
    if args.quiet {
        downloader = downloader.with_sink(Arc::new(NoProgress));
    }

    let outcome = tokio::task::spawn_blocking(move || downloader.download_with_retry(&req, &policy))
        .await
        .context("download task join")?
        .with_context(|| format!("download {}", url))?;

    if !args.quiet {
        match outcome {
            DownloadOutcome::AlreadyPresent => println!("{}: already up to date", dest.display()),
            DownloadOutcome::PromotedStaged => println!("{}: completed from staged file", dest.display()),
            DownloadOutcome::Transferred { strategy, bytes } => {
                println!("{}: {} bytes ({:?})", dest.display(), bytes, strategy)
            }
        }
    }
    Ok(())
}

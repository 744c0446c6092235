use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::download::DownloadOptions;
use crate::retry::RetryPolicy;
use crate::transfer::ChunkFailurePolicy;

/// Retry policy parameters (optional section in config.toml). Used by callers
/// that re-invoke a whole download; the downloader itself never retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per download (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 2.0,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/vdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VdlConfig {
    /// Files at least this large (and range-capable) are fetched in parallel chunks.
    pub concurrent_threshold_bytes: u64,
    /// Number of chunks for a concurrent download.
    pub concurrent_parts: usize,
    /// What sibling chunks do when one chunk fails.
    #[serde(default)]
    pub chunk_failure_policy: ChunkFailurePolicy,
    /// Whole-request ceiling for transfers.
    pub request_timeout_secs: u64,
    /// Whole-request ceiling for HEAD / trial range probes.
    pub probe_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Progress reporter tick.
    pub progress_interval_ms: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for VdlConfig {
    fn default() -> Self {
        Self {
            concurrent_threshold_bytes: 20 * 1024 * 1024,
            concurrent_parts: 4,
            chunk_failure_policy: ChunkFailurePolicy::default(),
            request_timeout_secs: 30 * 60,
            probe_timeout_secs: 30,
            connect_timeout_secs: 30,
            progress_interval_ms: 200,
            retry: None,
        }
    }
}

impl VdlConfig {
    /// Options for a `Downloader`, resolved once from this config.
    pub fn download_options(&self) -> DownloadOptions {
        let mut opts = DownloadOptions::default();
        opts.plan.concurrent_threshold = self.concurrent_threshold_bytes;
        opts.plan.concurrent_parts = self.concurrent_parts;
        opts.transfer.failure_policy = self.chunk_failure_policy;
        opts.transfer.request_timeout = Duration::from_secs(self.request_timeout_secs);
        opts.transfer.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        opts.probe.timeout = Duration::from_secs(self.probe_timeout_secs);
        opts.probe.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        opts.progress_interval = Duration::from_millis(self.progress_interval_ms.max(1));
        opts
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().to_policy()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: VdlConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

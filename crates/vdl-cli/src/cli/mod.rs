//! CLI for the VDL downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use vdl_core::config;

use commands::{run_checksum, run_completions, run_get, run_probe, run_verify};

/// Top-level CLI for the VDL downloader.
#[derive(Debug, Parser)]
#[command(name = "vdl")]
#[command(about = "VDL: verified, resumable, optionally parallel HTTP downloads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a file, resuming a previous attempt if possible.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Destination path (default: file name from the URL, in the current directory).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Expected SHA-256 (hex). Without it the file is accepted as-is.
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,

        /// Re-run the whole download up to N more times on retryable errors.
        #[arg(long, value_name = "N")]
        retries: Option<u32>,

        /// Do not print progress.
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show size, range support and the plan a fresh download would use.
    Probe {
        /// Direct HTTP/HTTPS URL to probe.
        url: String,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Check a file against an expected SHA-256; fails on mismatch.
    Verify {
        path: PathBuf,
        sha256: String,
    },

    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Get {
                url,
                output,
                sha256,
                retries,
                quiet,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let args = commands::GetArgs {
                    url,
                    output,
                    sha256,
                    retries,
                    quiet,
                };
                run_get(&cfg, args).await?;
            }
            CliCommand::Probe { url } => {
                let cfg = config::load_or_init()?;
                run_probe(&cfg, &url).await?;
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Verify { path, sha256 } => run_verify(&path, &sha256).await?,
            CliCommand::Completions { shell } => run_completions(shell)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

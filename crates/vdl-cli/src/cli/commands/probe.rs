//! `vdl probe <url>`: show what the server advertises and the plan a fresh download would use.

use anyhow::{Context, Result};
use vdl_core::config::VdlConfig;
use vdl_core::plan;
use vdl_core::probe;
use vdl_core::url_model;

pub async fn run_probe(cfg: &VdlConfig, url: &str) -> Result<()> {
    let url = url_model::validate_url(url)?;
    let opts = cfg.download_options();
    let remote = tokio::task::spawn_blocking({
        let url = url.to_string();
        let probe_opts = opts.probe;
        move || probe::probe(&url, &probe_opts)
    })
    .await
    .context("probe task join")??;

    let plan = plan::select_plan(&remote, 0, &opts.plan);
    match remote.total_size {
        Some(n) => println!("size:   {} bytes", n),
        None => println!("size:   unknown"),
    }
    println!("ranges: {}", if remote.supports_ranges { "yes" } else { "no" });
    println!("plan:   {}", plan);
    Ok(())
}

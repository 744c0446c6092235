//! `vdl verify <path> <sha256>`: compare a file against a digest.

use anyhow::{bail, Context, Result};
use std::path::Path;
use vdl_core::checksum::{self, DigestCheck};

pub async fn run_verify(path: &Path, expected: &str) -> Result<()> {
    let owned = path.to_path_buf();
    let expected_owned = expected.to_string();
    let check = tokio::task::spawn_blocking(move || checksum::check(&owned, Some(expected_owned.as_str())))
        .await
        .context("verify task join")??;
    match check {
        DigestCheck::Match | DigestCheck::Skipped => {
            println!("{}: OK", path.display());
            Ok(())
        }
        DigestCheck::Missing => bail!("{}: missing or empty", path.display()),
        DigestCheck::Mismatch { actual } => bail!(
            "{}: FAILED (expected {}, got {})",
            path.display(),
            expected.to_ascii_lowercase(),
            actual
        ),
    }
}

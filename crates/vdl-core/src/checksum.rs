//! SHA-256 integrity verification.
//!
//! Digests are computed on demand over the finished file, never inline with
//! the transfer, and are not cached between calls.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Outcome of comparing a file against an expected digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestCheck {
    /// No digest was expected; the file is accepted as-is.
    Skipped,
    /// File is absent or empty.
    Missing,
    Match,
    Mismatch { actual: String },
}

impl DigestCheck {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, DigestCheck::Skipped | DigestCheck::Match)
    }
}

/// Compare `path` against `expected` (hex, case-insensitive).
pub fn check(path: &Path, expected: Option<&str>) -> Result<DigestCheck> {
    let expected = match expected.map(str::trim) {
        Some(e) if !e.is_empty() => e,
        _ => return Ok(DigestCheck::Skipped),
    };
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => return Ok(DigestCheck::Missing),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DigestCheck::Missing),
        Err(e) => return Err(e).with_context(|| format!("stat {}", path.display())),
    }
    let actual = sha256_path(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(DigestCheck::Match)
    } else {
        Ok(DigestCheck::Mismatch { actual })
    }
}

/// True when `path` satisfies `expected`. An absent digest always passes;
/// a missing or empty file never does when a digest is given.
pub fn verify(path: &Path, expected: Option<&str>) -> Result<bool> {
    Ok(check(path, expected)?.is_satisfied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO_SHA: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

    #[test]
    fn sha256_path_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let digest = sha256_path(f.path()).unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_path_known_content() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        assert_eq!(sha256_path(f.path()).unwrap(), HELLO_SHA);
    }

    #[test]
    fn verify_without_digest_always_passes() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        assert!(verify(&missing, None).unwrap());
        assert!(verify(&missing, Some("")).unwrap());
    }

    #[test]
    fn verify_missing_or_empty_file_is_not_satisfied() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        assert_eq!(check(&missing, Some(HELLO_SHA)).unwrap(), DigestCheck::Missing);
        let empty = dir.path().join("empty.bin");
        std::fs::write(&empty, b"").unwrap();
        assert!(!verify(&empty, Some(HELLO_SHA)).unwrap());
    }

    #[test]
    fn verify_is_case_insensitive() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        let upper = HELLO_SHA.to_ascii_uppercase();
        assert!(verify(f.path(), Some(&upper)).unwrap());
    }

    #[test]
    fn check_reports_actual_digest_on_mismatch() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        match check(f.path(), Some("00")).unwrap() {
            DigestCheck::Mismatch { actual } => assert_eq!(actual, HELLO_SHA),
            other => panic!("expected mismatch, got {:?}", other),
        }
    }
}

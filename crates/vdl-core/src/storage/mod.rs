//! Disk I/O and staging file lifecycle.
//!
//! Every download goes through exactly one staging artifact,
//! `<destination>.part`, next to the destination. It is presized for
//! concurrent offset writes (pwrite) and promoted by rename once verified.

mod builder;
mod writer;

use std::io;
use std::path::{Path, PathBuf};

pub use builder::StorageWriterBuilder;
pub use writer::StorageWriter;

use crate::error::DownloadError;

/// Staging file suffix used before the rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the staging file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Size of the file at `path`, 0 if it does not exist.
pub fn existing_len(path: &Path) -> Result<u64, DownloadError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(DownloadError::storage(path, e)),
    }
}

/// Delete `path`; a missing file is not an error.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Replace `final_path` with the staging file. The rename is atomic on the
/// same filesystem, so readers never observe a partially written destination.
pub fn promote(part: &Path, final_path: &Path) -> Result<(), DownloadError> {
    let promote_err = |source| DownloadError::Promote {
        from: part.to_path_buf(),
        to: final_path.to_path_buf(),
        source,
    };
    remove_if_exists(final_path).map_err(promote_err)?;
    std::fs::rename(part, final_path).map_err(promote_err)
}

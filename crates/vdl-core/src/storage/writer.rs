//! Concurrent offset writer for staging files.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::DownloadError;

/// Writer for a staging file. Safe to clone and use from multiple threads;
/// each `write_at` is an independent positioned write (pwrite-style), so
/// writers filling disjoint ranges never interfere.
#[derive(Clone)]
pub struct StorageWriter {
    file: Arc<File>,
    temp_path: PathBuf,
}

impl StorageWriter {
    /// Create from an open file and path (used by StorageWriterBuilder).
    pub(crate) fn from_file_and_path(file: File, temp_path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            temp_path,
        }
    }

    /// Open an existing staging file for resume (no truncation).
    pub fn open_existing(temp_path: &Path) -> Result<Self, DownloadError> {
        let file = File::options()
            .write(true)
            .open(temp_path)
            .map_err(|e| DownloadError::storage(temp_path, e))?;
        Ok(Self::from_file_and_path(file, temp_path.to_path_buf()))
    }

    /// Write all of `data` at `offset`. Does not move a shared cursor; safe for concurrent use.
    pub fn write_at(&self, offset: u64, data: &[u8]) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.write_all_at(data, offset)
        }
        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            let mut written = 0;
            while written < data.len() {
                let n = self
                    .file
                    .seek_write(&data[written..], offset + written as u64)?;
                if n == 0 {
                    return Err(std::io::ErrorKind::WriteZero.into());
                }
                written += n;
            }
            Ok(())
        }
    }

    /// Sync file data to disk. Call before promoting for durability.
    pub fn sync(&self) -> Result<(), DownloadError> {
        self.file
            .sync_all()
            .map_err(|e| DownloadError::storage(&self.temp_path, e))
    }

    /// Path to the staging file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }
}

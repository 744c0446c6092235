//! Builder for creating and presizing `.part` staging files.

use std::fs::File;
use std::path::{Path, PathBuf};

use super::writer::StorageWriter;
use crate::error::DownloadError;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Builder for a fresh staging file. Call `preallocate` then `build` to get
/// a `StorageWriter` that supports concurrent `write_at` from multiple threads.
pub struct StorageWriterBuilder {
    file: File,
    temp_path: PathBuf,
}

impl StorageWriterBuilder {
    /// Create the staging file at `temp_path`, truncating any previous content.
    pub fn create(temp_path: &Path) -> Result<Self, DownloadError> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .map_err(|e| DownloadError::storage(temp_path, e))?;
        Ok(StorageWriterBuilder {
            file,
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Size the file to exactly `size` bytes so positioned writes never extend
    /// it. On Linux tries `posix_fallocate` for real block allocation; falls
    /// back to `set_len` on failure or elsewhere.
    pub fn preallocate(&mut self, size: u64) -> Result<(), DownloadError> {
        #[cfg(target_os = "linux")]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file
            .set_len(size)
            .map_err(|e| DownloadError::storage(&self.temp_path, e))
    }

    /// Finish building and return a writer that can be shared for concurrent writes.
    pub fn build(self) -> StorageWriter {
        StorageWriter::from_file_and_path(self.file, self.temp_path)
    }
}

use fs4::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock over a cache directory.
///
/// Held while checking for and installing a version so concurrent kiln
/// processes do not install into the same store at once. Released on drop.
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    pub const FILE_NAME: &'static str = ".kiln.lock";

    /// Block until the lock for `dir` is held.
    pub fn acquire(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                tracing::info!("waiting for another kiln process to release {}", path.display());
                file.lock_exclusive()?;
            }
            Err(err) => return Err(err),
        }

        Ok(Self { file, path })
    }

    /// [`acquire`](Self::acquire) on the blocking pool, so waiting for
    /// another process does not stall the async runtime.
    pub async fn acquire_async(dir: PathBuf) -> io::Result<Self> {
        tokio::task::spawn_blocking(move || Self::acquire(&dir))
            .await
            .map_err(io::Error::other)?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::debug!("failed to unlock {}: {err}", self.path.display());
        }
    }
}

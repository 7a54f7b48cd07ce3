use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::TEMP_FILE_PREFIX;

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary benchmark file, removed when dropped
pub struct TempFile {
    path: PathBuf,
    file: File,
    removed: bool,
}

impl TempFile {
    /// Create a new, uniquely named file in `dir` with page-cache hints applied
    pub fn create(dir: &Path) -> io::Result<Self> {
        let sequence = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}{}_{}.bench", TEMP_FILE_PREFIX, process::id(), sequence);
        let path = dir.join(name);

        let file = open_uncached(&path)?;
        Ok(Self {
            path,
            file,
            removed: false,
        })
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&mut self) -> &mut File {
        &mut self.file
    }

    /// Delete the file now, reporting failure instead of ignoring it
    pub fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        fs::remove_file(&self.path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.removed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Open a fresh read/write file, refusing to reuse an existing path
pub fn open_uncached(path: &Path) -> io::Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)?;

    platform::bypass_cache(&file)?;
    Ok(file)
}

/// Ask the OS to drop cached pages of `file` so the next read hits the device
pub fn evict_cache(file: &File) -> io::Result<()> {
    platform::evict(file)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod platform {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub fn bypass_cache(file: &File) -> io::Result<()> {
        evict(file)
    }

    pub fn evict(file: &File) -> io::Result<()> {
        // SAFETY: the descriptor is owned by `file` and stays open for the call
        let ret = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_DONTNEED) };
        if ret != 0 {
            return Err(io::Error::from_raw_os_error(ret));
        }
        Ok(())
    }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
mod platform {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub fn bypass_cache(file: &File) -> io::Result<()> {
        // SAFETY: the descriptor is owned by `file` and stays open for the call
        let ret = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_NOCACHE, 1) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn evict(file: &File) -> io::Result<()> {
        // SAFETY: as above
        let ret = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
mod platform {
    use std::fs::File;
    use std::io;

    pub fn bypass_cache(_file: &File) -> io::Result<()> {
        Ok(())
    }

    pub fn evict(_file: &File) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom, Write};
    use tempfile::tempdir;

    #[test]
    fn test_temp_file_creation() {
        let temp_dir = tempdir().unwrap();

        let temp_file = TempFile::create(temp_dir.path()).unwrap();
        assert!(temp_file.path().exists());
        assert!(temp_file
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(TEMP_FILE_PREFIX));

        // File should be cleaned up when dropped
        let path = temp_file.path().to_owned();
        drop(temp_file);
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_file_names_are_unique() {
        let temp_dir = tempdir().unwrap();
        let a = TempFile::create(temp_dir.path()).unwrap();
        let b = TempFile::create(temp_dir.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_explicit_remove() {
        let temp_dir = tempdir().unwrap();
        let temp_file = TempFile::create(temp_dir.path()).unwrap();
        let path = temp_file.path().to_owned();

        temp_file.remove().unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_reports_missing_file() {
        let temp_dir = tempdir().unwrap();
        let temp_file = TempFile::create(temp_dir.path()).unwrap();
        std::fs::remove_file(temp_file.path()).unwrap();

        let err = temp_file.remove().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_write_evict_read() {
        let temp_dir = tempdir().unwrap();
        let mut temp_file = TempFile::create(temp_dir.path()).unwrap();

        let file = temp_file.file();
        file.write_all(b"acubench").unwrap();
        file.sync_all().unwrap();
        evict_cache(file).unwrap();

        file.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = [0u8; 8];
        file.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"acubench");
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let temp_dir = tempdir().unwrap();
        assert!(TempFile::create(&temp_dir.path().join("missing")).is_err());
    }
}

//! [`FileSystem`] backed by the process and the real disk.

use std::io::ErrorKind;
use std::path::Path;

use tracing::trace;

use jumpdir_core::path;
use jumpdir_core::{FsError, VolumeInfo};

use crate::{volume_name, DirEntry, FileSystem};

/// The real filesystem and the process working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl StdFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn io_error(path: &str, source: std::io::Error) -> FsError {
    match source.kind() {
        ErrorKind::NotFound => FsError::NotFound(path.to_string()),
        _ => FsError::Io {
            path: path.to_string(),
            source,
        },
    }
}

impl FileSystem for StdFileSystem {
    fn current_dir(&self) -> Result<String, FsError> {
        let cwd = std::env::current_dir().map_err(|e| io_error(".", e))?;
        Ok(path::normalize(&cwd.to_string_lossy()))
    }

    fn set_current_dir(&mut self, target: &str) -> Result<(), FsError> {
        let native = Path::new(target);
        if !native.exists() {
            return Err(FsError::NotFound(target.to_string()));
        }
        if !native.is_dir() {
            return Err(FsError::NotADirectory(target.to_string()));
        }
        std::env::set_current_dir(native).map_err(|e| io_error(target, e))
    }

    fn read_dir(&self, dir: &str) -> Result<Vec<DirEntry>, FsError> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
            let entry = entry.map_err(|e| io_error(dir, e))?;
            let Ok(name) = entry.file_name().into_string() else {
                trace!(dir, "skipping entry with a non UTF-8 name");
                continue;
            };
            // Follows symlinks, so a link to a directory counts as one.
            let is_dir = entry.path().is_dir();
            entries.push(DirEntry { name, is_dir });
        }
        Ok(entries)
    }

    fn is_dir(&self, target: &str) -> bool {
        Path::new(target).is_dir()
    }

    fn volume_info(&self, target: &str) -> Result<VolumeInfo, FsError> {
        let root = path::root_of(target).ok_or_else(|| FsError::NotFound(target.to_string()))?;
        let metadata = std::fs::metadata(target).map_err(|e| io_error(target, e))?;
        Ok(VolumeInfo::new(volume_name(root), "", serial_number(&metadata)))
    }
}

#[cfg(unix)]
fn serial_number(metadata: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.dev()
}

#[cfg(not(unix))]
fn serial_number(_metadata: &std::fs::Metadata) -> u64 {
    0
}

//! # jumpdir-fs
//!
//! The filesystem seen by the resolver.
//!
//! Everything the resolver needs from the platform goes through the
//! [`FileSystem`] trait: listing a directory, checking that a path is a
//! directory, reading and changing the working directory, and identifying
//! the volume a path lives on. [`StdFileSystem`] talks to the real disk;
//! [`MemoryFileSystem`] is an in-memory tree for tests.
//!
//! All paths crossing this boundary are normalized strings (see
//! [`jumpdir_core::path`]).

pub mod memory;
pub mod std_fs;

use jumpdir_core::{FsError, VolumeInfo};

pub use memory::MemoryFileSystem;
pub use std_fs::StdFileSystem;

/// Volume name for a normalized root: `C:` for a drive, the root itself
/// otherwise.
fn volume_name(root: String) -> String {
    match root.strip_suffix('/') {
        Some(drive) if drive.ends_with(':') => drive.to_string(),
        _ => root,
    }
}

/// One entry returned by [`FileSystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Directory access and working-directory control.
pub trait FileSystem {
    /// The working directory, normalized.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::Io`] if the platform cannot report it.
    fn current_dir(&self) -> Result<String, FsError>;

    /// Change the working directory to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::NotFound`] or [`FsError::NotADirectory`] when
    /// `path` is not an existing directory.
    fn set_current_dir(&mut self, path: &str) -> Result<(), FsError>;

    /// Entries directly under `path`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an [`FsError`] if `path` cannot be listed.
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, FsError>;

    /// True if `path` exists and is a directory.
    fn is_dir(&self, path: &str) -> bool;

    /// Identity of the volume holding `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`FsError`] if the volume cannot be queried.
    fn volume_info(&self, path: &str) -> Result<VolumeInfo, FsError>;

    /// Names of the subdirectories of `path`, sorted. Unlistable
    /// directories yield nothing.
    fn subdirectories(&self, path: &str) -> Vec<String> {
        let mut names: Vec<String> = match self.read_dir(path) {
            Ok(entries) => entries
                .into_iter()
                .filter(|e| e.is_dir)
                .map(|e| e.name)
                .collect(),
            Err(e) => {
                tracing::trace!(dir = path, error = %e, "skipping unreadable directory");
                Vec::new()
            }
        };
        names.sort();
        names
    }
}

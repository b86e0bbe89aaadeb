//! In-memory [`FileSystem`] used by tests and dry runs.
//!
//! Lookups ignore letter case and names keep the case they were created with,
//! the way directory names behave on the platforms jumpdir grew up on.

use std::collections::BTreeMap;

use jumpdir_core::path;
use jumpdir_core::{FsError, VolumeInfo};

use crate::{volume_name, DirEntry, FileSystem};

#[derive(Debug, Clone)]
struct Node {
    path: String,
    is_dir: bool,
}

/// A directory tree held in memory with its own working directory.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    cwd: String,
    /// Keyed by the case-folded normalized path.
    nodes: BTreeMap<String, Node>,
    /// Keyed by the case-folded root.
    volumes: BTreeMap<String, VolumeInfo>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MemoryFileSystem {
    /// A tree holding only `cwd` and its ancestors, with `cwd` current.
    #[must_use]
    pub fn new(cwd: &str) -> Self {
        let mut fs = Self {
            cwd: path::normalize(cwd),
            nodes: BTreeMap::new(),
            volumes: BTreeMap::new(),
        };
        let cwd = fs.cwd.clone();
        fs.add_dir(&cwd);
        fs
    }

    /// Create a directory and any missing ancestors.
    pub fn add_dir(&mut self, dir: &str) -> &mut Self {
        let dir = path::normalize(dir);
        let mut current = Some(dir);
        while let Some(p) = current {
            current = path::parent(&p);
            self.nodes
                .entry(path::fold_case(&p))
                .or_insert(Node { path: p, is_dir: true });
        }
        self
    }

    /// Create a file, adding its parent directories.
    pub fn add_file(&mut self, file: &str) -> &mut Self {
        let file = path::normalize(file);
        if let Some(parent) = path::parent(&file) {
            self.add_dir(&parent);
        }
        self.nodes.insert(
            path::fold_case(&file),
            Node {
                path: file,
                is_dir: false,
            },
        );
        self
    }

    /// Delete `target` and everything below it.
    pub fn remove(&mut self, target: &str) -> &mut Self {
        let target = path::normalize(target);
        self.nodes
            .retain(|_, node| path::relative_to(&node.path, &target).is_none());
        self
    }

    /// Report `info` for every path under `root`.
    pub fn set_volume(&mut self, root: &str, info: VolumeInfo) -> &mut Self {
        if let Some(root) = path::root_of(root) {
            self.volumes.insert(path::fold_case(&root), info);
        }
        self
    }

    fn node(&self, target: &str) -> Option<&Node> {
        self.nodes.get(&path::fold_case(&path::normalize(target)))
    }
}

impl FileSystem for MemoryFileSystem {
    fn current_dir(&self) -> Result<String, FsError> {
        Ok(self.cwd.clone())
    }

    fn set_current_dir(&mut self, target: &str) -> Result<(), FsError> {
        match self.node(target) {
            Some(node) if node.is_dir => {
                self.cwd = node.path.clone();
                Ok(())
            }
            Some(_) => Err(FsError::NotADirectory(target.to_string())),
            None => Err(FsError::NotFound(target.to_string())),
        }
    }

    fn read_dir(&self, dir: &str) -> Result<Vec<DirEntry>, FsError> {
        match self.node(dir) {
            Some(node) if node.is_dir => {}
            Some(_) => return Err(FsError::NotADirectory(dir.to_string())),
            None => return Err(FsError::NotFound(dir.to_string())),
        }
        let dir = path::fold_case(&path::normalize(dir));
        Ok(self
            .nodes
            .values()
            .filter(|node| {
                path::parent(&node.path).is_some_and(|p| path::fold_case(&p) == dir)
            })
            .filter_map(|node| {
                path::segments(&node.path).last().map(|name| DirEntry {
                    name: (*name).to_string(),
                    is_dir: node.is_dir,
                })
            })
            .collect())
    }

    fn is_dir(&self, target: &str) -> bool {
        self.node(target).is_some_and(|node| node.is_dir)
    }

    fn volume_info(&self, target: &str) -> Result<VolumeInfo, FsError> {
        if self.node(target).is_none() {
            return Err(FsError::NotFound(target.to_string()));
        }
        let root = path::root_of(target).ok_or_else(|| FsError::NotFound(target.to_string()))?;
        Ok(self
            .volumes
            .get(&path::fold_case(&root))
            .cloned()
            .unwrap_or_else(|| VolumeInfo::new(volume_name(root), "", 0)))
    }
}

//! History data model: entries, header flags, and volume identity.

use chrono::{DateTime, Utc};

/// Identity of the storage volume a directory lives on.
///
/// `name` together with `serial_number` detects the same volume across
/// drive-letter remaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VolumeInfo {
    pub name: String,
    pub label: String,
    pub serial_number: u64,
}

impl VolumeInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>, serial_number: u64) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            serial_number,
        }
    }
}

/// Stable handle to an entry within one load cycle of a history store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub u32);

/// A remembered directory, borrowed from the store that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry<'a> {
    pub id: EntryId,
    pub volume_name: &'a str,
    pub volume_label: &'a str,
    /// Normalized absolute path.
    pub path: &'a str,
    pub last_verified: DateTime<Utc>,
    pub serial_number: u64,
    /// False once the entry has been tombstoned.
    pub valid: bool,
}

/// Behavior flags and bookkeeping persisted at the head of the history file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryHeader {
    /// Entry cap; `-1` means unbounded.
    pub max_hist_size: i32,
    /// Echo the new directory after changing to it.
    pub dir_echo: bool,
    /// Echo the shell commands being issued.
    pub verbose: bool,
    /// Allow filesystem searches to traverse network (UNC) paths.
    pub net_search: bool,
    /// Automatically map network drives. Persisted only.
    pub automap: bool,
    /// Live (non-tombstoned) entry count.
    pub num_hist_entries: u32,
}

impl Default for HistoryHeader {
    fn default() -> Self {
        Self {
            max_hist_size: -1,
            dir_echo: false,
            verbose: false,
            net_search: true,
            automap: true,
            num_hist_entries: 0,
        }
    }
}

impl HistoryHeader {
    /// The entry cap, or `None` when unbounded.
    #[must_use]
    pub fn cap(&self) -> Option<usize> {
        usize::try_from(self.max_hist_size).ok()
    }
}

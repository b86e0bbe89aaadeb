//! # jumpdir-history
//!
//! Persistent history of previously visited directories.
//!
//! The [`HistoryStore`] keeps entries in recency order (most recent first),
//! keyed by volume identity and normalized path:
//! - lookup by wildcard pattern ([`HistoryStore::find_candidates`])
//! - insert or refresh ([`HistoryStore::add_or_refresh`]) with capped eviction
//! - tombstoning of directories that no longer exist ([`HistoryStore::invalidate`])
//! - atomic persistence ([`HistoryStore::load`] / [`HistoryStore::store`])

pub mod codec;
pub mod lock;
pub mod strings;

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, trace};

use jumpdir_core::path;
use jumpdir_core::{EntryId, HistoryEntry, HistoryError, HistoryHeader, VolumeInfo};
use jumpdir_pattern::{Pattern, Specificity, WildcardMatcher};

use crate::codec::{DecodeError, RecordImage};
use crate::strings::{StrId, StringTable};

pub use lock::HistoryLock;

/// An entry as held in memory; strings live in the store's [`StringTable`].
#[derive(Debug, Clone)]
struct Record {
    volume_name: StrId,
    volume_label: StrId,
    path: StrId,
    last_verified: DateTime<Utc>,
    serial_number: u64,
    valid: bool,
}

/// A live history entry that matched a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMatch<'a> {
    pub entry: HistoryEntry<'a>,
    pub specificity: Specificity,
}

/// Ordered, persistent collection of visited directories.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    header: HistoryHeader,
    strings: StringTable,
    /// Indexed by [`EntryId`]; ids stay stable within a load cycle.
    records: Vec<Record>,
    /// Most recent first. Holds tombstoned ids too.
    recency: Vec<EntryId>,
    dirty: bool,
}

impl HistoryStore {
    /// An empty store with default header flags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store with the given header flags.
    #[must_use]
    pub fn with_header(header: HistoryHeader) -> Self {
        Self {
            header: HistoryHeader {
                num_hist_entries: 0,
                ..header
            },
            ..Self::default()
        }
    }

    /// Load a store from `path`. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Corrupt`] if the file is unreadable, truncated,
    /// or fails validation, and [`HistoryError::UnsupportedVersion`] if it was
    /// written by a newer format.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(history = %path.display(), "no history file yet, starting empty");
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(HistoryError::Corrupt {
                    path: path.to_path_buf(),
                    reason: format!("unreadable: {e}"),
                })
            }
        };

        let decoded = codec::decode(&bytes).map_err(|e| match e {
            DecodeError::Corrupt(reason) => HistoryError::Corrupt {
                path: path.to_path_buf(),
                reason,
            },
            DecodeError::UnsupportedVersion(found) => HistoryError::UnsupportedVersion {
                path: path.to_path_buf(),
                found,
            },
        })?;

        let records: Vec<Record> = decoded
            .records
            .into_iter()
            .map(|r| Record {
                volume_name: r.volume_name,
                volume_label: r.volume_label,
                path: r.path,
                last_verified: r.last_verified,
                serial_number: r.serial_number,
                valid: r.valid,
            })
            .collect();
        let recency = (0..records.len()).map(entry_id).collect();

        debug!(
            history = %path.display(),
            live = decoded.header.num_hist_entries,
            records = records.len(),
            "history loaded"
        );

        Ok(Self {
            header: decoded.header,
            strings: decoded.strings,
            records,
            recency,
            dirty: false,
        })
    }

    /// Persist the store to `path` atomically.
    ///
    /// The blob is written to a temporary file in the same directory and
    /// renamed over `path`; on failure the previous file is untouched.
    /// Tombstones are written out unless they outnumber live entries, in
    /// which case they are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::WriteFailed`] if any step fails.
    pub fn store(&mut self, path: &Path) -> Result<(), HistoryError> {
        let write_failed = |source| HistoryError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let live = self.len();
        let tombstones = self.records.len() - live;
        let compact = tombstones > live;

        let images: Vec<RecordImage<'_>> = self
            .recency
            .iter()
            .map(|&id| &self.records[id.0 as usize])
            .filter(|r| r.valid || !compact)
            .map(|r| RecordImage {
                volume_name: self.text(r.volume_name),
                volume_label: self.text(r.volume_label),
                path: self.text(r.path),
                last_verified: r.last_verified,
                serial_number: r.serial_number,
                valid: r.valid,
            })
            .collect();
        let bytes = codec::encode(&self.header, &images);

        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_failed)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
        tmp.write_all(&bytes).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;
        tmp.persist(path).map_err(|e| write_failed(e.error))?;

        debug!(
            history = %path.display(),
            bytes = bytes.len(),
            records = images.len(),
            compacted = compact,
            "history stored"
        );
        self.dirty = false;
        Ok(())
    }

    #[must_use]
    pub fn header(&self) -> &HistoryHeader {
        &self.header
    }

    /// Replace the behavior flags. `num_hist_entries` is managed by the store
    /// and the value passed in is ignored.
    pub fn set_header(&mut self, header: HistoryHeader) {
        self.header = HistoryHeader {
            num_hist_entries: self.header.num_hist_entries,
            ..header
        };
        self.dirty = true;
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.header.num_hist_entries as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the store changed since it was loaded or last stored.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Treat the in-memory state as persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Look up any entry, live or tombstoned.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<HistoryEntry<'_>> {
        self.records.get(id.0 as usize).map(|r| self.view(id, r))
    }

    /// Live entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = HistoryEntry<'_>> {
        self.recency.iter().filter_map(move |&id| {
            let record = &self.records[id.0 as usize];
            record.valid.then(|| self.view(id, record))
        })
    }

    /// Find the entry with this identity key, live or tombstoned. Paths
    /// compare case-insensitively.
    #[must_use]
    pub fn find(&self, path: &str, volume: &VolumeInfo) -> Option<EntryId> {
        let path = path::normalize(path);
        self.records
            .iter()
            .position(|r| {
                r.serial_number == volume.serial_number
                    && self.text(r.volume_name) == volume.name
                    && path::eq_ignore_case(self.text(r.path), &path)
            })
            .map(entry_id)
    }

    /// All live entries whose path matches `pattern`, by descending
    /// specificity and then descending recency.
    #[must_use]
    pub fn find_candidates(
        &self,
        pattern: &Pattern,
        matcher: &WildcardMatcher,
    ) -> Vec<HistoryMatch<'_>> {
        let mut matches: Vec<HistoryMatch<'_>> = self
            .entries()
            .filter_map(|entry| {
                matcher
                    .match_path(pattern, entry.path)
                    .map(|specificity| HistoryMatch { entry, specificity })
            })
            .collect();
        // Stable: equal specificity keeps recency order.
        matches.sort_by(|a, b| b.specificity.cmp(&a.specificity));
        trace!(pattern = %pattern, matches = matches.len(), "history candidates");
        matches
    }

    /// Mark an entry as just verified and move it to the most recent position.
    ///
    /// Returns false for unknown or tombstoned entries.
    pub fn touch(&mut self, id: EntryId) -> bool {
        self.touch_at(id, Utc::now())
    }

    /// [`Self::touch`] with an explicit clock reading.
    pub fn touch_at(&mut self, id: EntryId, now: DateTime<Utc>) -> bool {
        let Some(record) = self.records.get_mut(id.0 as usize) else {
            return false;
        };
        if !record.valid {
            return false;
        }
        record.last_verified = record.last_verified.max(now.trunc_subsecs(0));
        self.move_to_front(id);
        self.dirty = true;
        true
    }

    /// Insert `path` or refresh the entry that already has its identity key.
    ///
    /// A refreshed tombstone comes back to life and takes the casing of
    /// `path`. When the live count then exceeds a non-negative
    /// `max_hist_size`, the least recently verified other live entry is
    /// tombstoned.
    ///
    /// Returns `None`, leaving the store untouched, if `path` is not absolute.
    /// Timestamps are kept to whole seconds, the resolution of the file.
    pub fn add_or_refresh(&mut self, path: &str, volume: &VolumeInfo) -> Option<EntryId> {
        self.add_or_refresh_at(path, volume, Utc::now())
    }

    /// [`Self::add_or_refresh`] with an explicit clock reading.
    pub fn add_or_refresh_at(
        &mut self,
        path: &str,
        volume: &VolumeInfo,
        now: DateTime<Utc>,
    ) -> Option<EntryId> {
        let normalized = path::normalize(path);
        if !path::is_absolute(&normalized) {
            debug!(path, "refusing to record a relative path");
            return None;
        }
        let now = now.trunc_subsecs(0);
        let label = self.strings.intern(&volume.label);

        let id = match self.find(&normalized, volume) {
            Some(id) => {
                let path_id = self.strings.intern(&normalized);
                let record = &mut self.records[id.0 as usize];
                record.volume_label = label;
                record.path = path_id;
                record.last_verified = record.last_verified.max(now);
                if !record.valid {
                    record.valid = true;
                    self.header.num_hist_entries += 1;
                }
                self.move_to_front(id);
                trace!(path = %normalized, "history entry refreshed");
                id
            }
            None => {
                let record = Record {
                    volume_name: self.strings.intern(&volume.name),
                    volume_label: label,
                    path: self.strings.intern(&normalized),
                    last_verified: now,
                    serial_number: volume.serial_number,
                    valid: true,
                };
                let id = entry_id(self.records.len());
                self.records.push(record);
                self.recency.insert(0, id);
                self.header.num_hist_entries += 1;
                trace!(path = %normalized, "history entry added");
                id
            }
        };

        self.dirty = true;
        self.enforce_cap(id);
        Some(id)
    }

    /// Tombstone an entry whose directory no longer exists.
    ///
    /// Returns false if the entry was unknown or already tombstoned.
    pub fn invalidate(&mut self, id: EntryId) -> bool {
        let Some(record) = self.records.get_mut(id.0 as usize) else {
            return false;
        };
        if !record.valid {
            return false;
        }
        record.valid = false;
        self.header.num_hist_entries -= 1;
        self.dirty = true;
        trace!(entry = id.0, "history entry tombstoned");
        true
    }

    fn enforce_cap(&mut self, keep: EntryId) {
        let Some(cap) = self.header.cap() else {
            return;
        };
        while self.len() > cap {
            let victim = self.oldest_live_except(keep).unwrap_or(keep);
            debug!(
                path = %self.text(self.records[victim.0 as usize].path),
                cap,
                "evicting least recently verified history entry"
            );
            self.invalidate(victim);
        }
    }

    /// Least recently verified live entry other than `keep`. Ties go to the
    /// entry further back in recency order.
    fn oldest_live_except(&self, keep: EntryId) -> Option<EntryId> {
        self.recency
            .iter()
            .rev()
            .copied()
            .filter(|&id| id != keep && self.records[id.0 as usize].valid)
            .min_by_key(|&id| self.records[id.0 as usize].last_verified)
    }

    fn move_to_front(&mut self, id: EntryId) {
        if let Some(pos) = self.recency.iter().position(|&r| r == id) {
            self.recency.remove(pos);
        }
        self.recency.insert(0, id);
    }

    fn view<'a>(&'a self, id: EntryId, record: &Record) -> HistoryEntry<'a> {
        HistoryEntry {
            id,
            volume_name: self.text(record.volume_name),
            volume_label: self.text(record.volume_label),
            path: self.text(record.path),
            last_verified: record.last_verified,
            serial_number: record.serial_number,
            valid: record.valid,
        }
    }

    fn text(&self, id: StrId) -> &str {
        self.strings.get(id).unwrap_or_default()
    }
}

fn entry_id(index: usize) -> EntryId {
    EntryId(u32::try_from(index).unwrap_or(u32::MAX))
}

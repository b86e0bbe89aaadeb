//! The resolution state machine.
//!
//! `start → trivial check → {resolved | search} → {resolved | ambiguous | not found}`
//!
//! Nothing is written to the history unless the request ends in a directory
//! change, so `NotFound` and `Ambiguous` leave the store exactly as loaded.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use jumpdir_core::path;
use jumpdir_core::{EntryId, FsError, HistoryHeader, ResolveError};
use jumpdir_fs::FileSystem;
use jumpdir_history::HistoryStore;
use jumpdir_pattern::{parse_in, Pattern, WildcardMatcher};

use crate::candidate::{self, Candidate, Source};
use crate::destination::{Destination, DestinationKind};
use crate::search::{self, SearchLimits};

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing to do; the shell stays in `cwd`.
    Unchanged { cwd: String },
    /// The working directory is now `target`.
    Changed { target: String },
}

impl Resolution {
    /// The directory the shell ends up in.
    #[must_use]
    pub fn directory(&self) -> &str {
        match self {
            Self::Unchanged { cwd } => cwd,
            Self::Changed { target } => target,
        }
    }
}

/// Per-invocation knobs, taken from the configuration and the history header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveOptions {
    pub limits: SearchLimits,
}

impl ResolveOptions {
    #[must_use]
    pub fn from_header(header: &HistoryHeader, search_depth: usize) -> Self {
        Self {
            limits: SearchLimits {
                max_depth: search_depth,
                net_search: header.net_search,
                ..SearchLimits::default()
            },
        }
    }
}

/// Resolves destination strings against a history and a filesystem.
pub struct JumpResolver<'a, F: FileSystem + ?Sized> {
    fs: &'a mut F,
    history: &'a mut HistoryStore,
    matcher: WildcardMatcher,
    options: ResolveOptions,
    now: DateTime<Utc>,
}

impl<'a, F: FileSystem + ?Sized> JumpResolver<'a, F> {
    pub fn new(fs: &'a mut F, history: &'a mut HistoryStore, options: ResolveOptions) -> Self {
        Self {
            fs,
            history,
            matcher: WildcardMatcher::new(),
            options,
            now: Utc::now(),
        }
    }

    /// Use `now` as the verification time for every history update.
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Resolve `raw` and change the working directory to the result.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] when no existing directory matches
    /// - [`ResolveError::Ambiguous`] when several candidates tie on every ranking key
    /// - [`ResolveError::Fs`] when the working directory cannot be read
    pub fn resolve(&mut self, raw: &str) -> Result<Resolution, ResolveError> {
        let cwd = self.fs.current_dir()?;
        let destination = Destination::classify(raw);
        debug!(destination = %destination.text(), kind = ?destination.kind(), cwd = %cwd, "resolving");

        if destination.is_trivial() {
            return self.change_trivially(&destination, cwd);
        }
        if destination.kind() == DestinationKind::Literal {
            let target = path::join(&cwd, destination.text());
            if path::eq_ignore_case(&target, &cwd) {
                return Ok(Resolution::Unchanged { cwd });
            }
            match self.fs.set_current_dir(&target) {
                Ok(()) => {
                    let target = self.fs.current_dir().unwrap_or(target);
                    self.record(&target);
                    return Ok(Resolution::Changed { target });
                }
                Err(e) => {
                    debug!(target = %target, error = %e, "direct change failed, searching");
                }
            }
        }

        self.search(&destination, &cwd)
    }

    /// Empty, `.` and dot-relative destinations: no history, no search.
    fn change_trivially(
        &mut self,
        destination: &Destination,
        cwd: String,
    ) -> Result<Resolution, ResolveError> {
        if destination.kind() != DestinationKind::DotRelative {
            return Ok(Resolution::Unchanged { cwd });
        }
        let target = path::join(&cwd, destination.text());
        match self.fs.set_current_dir(&target) {
            Ok(()) => Ok(Resolution::Changed { target }),
            Err(e) => {
                debug!(target = %target, error = %e, "literal relative change failed");
                Err(not_found(destination))
            }
        }
    }

    fn search(&mut self, destination: &Destination, cwd: &str) -> Result<Resolution, ResolveError> {
        let pattern = parse_in(destination.text(), cwd);

        let mut candidates: Vec<Candidate> = self
            .history
            .find_candidates(&pattern, &self.matcher)
            .into_iter()
            .map(|m| Candidate {
                path: m.entry.path.to_string(),
                specificity: m.specificity,
                last_verified: Some(m.entry.last_verified),
                source: Source::History(m.entry.id),
            })
            .collect();
        let mut from_history = !candidates.is_empty();
        if !from_history {
            candidates = self.search_filesystem(&pattern, cwd);
        }
        debug!(pattern = %pattern, candidates = candidates.len(), from_history, "candidates collected");
        candidate::rank(&mut candidates);

        let mut stale: Vec<EntryId> = Vec::new();
        let winner = loop {
            if candidates.is_empty() {
                if from_history {
                    // Everything history knew about is gone; look at the disk.
                    from_history = false;
                    candidates = self.search_filesystem(&pattern, cwd);
                    candidate::rank(&mut candidates);
                    continue;
                }
                return Err(not_found(destination));
            }

            let group_len = candidate::top_group_len(&candidates);
            let (alive, dead): (Vec<Candidate>, Vec<Candidate>) = candidates
                .drain(..group_len)
                .partition(|c| self.fs.is_dir(&c.path));
            for c in dead {
                trace!(path = %c.path, "candidate no longer exists");
                if let Source::History(id) = c.source {
                    stale.push(id);
                }
            }

            match alive.len() {
                0 => continue,
                1 => break alive.into_iter().next(),
                _ => {
                    for c in &alive {
                        debug!(path = %c.path, specificity = ?c.specificity, "tied candidate");
                    }
                    return Err(ResolveError::Ambiguous {
                        destination: destination.text().to_string(),
                        candidates: alive.into_iter().map(|c| c.path).collect(),
                    });
                }
            }
        };
        let Some(winner) = winner else {
            return Err(not_found(destination));
        };

        self.fs.set_current_dir(&winner.path).map_err(|e| match e {
            FsError::NotFound(_) | FsError::NotADirectory(_) => not_found(destination),
            other => ResolveError::Fs(other),
        })?;

        for id in stale {
            self.history.invalidate(id);
        }
        match winner.source {
            Source::History(id) => {
                self.history.touch_at(id, self.now);
            }
            Source::Filesystem => self.record(&winner.path),
        }
        debug!(target = %winner.path, "resolved");
        Ok(Resolution::Changed {
            target: winner.path,
        })
    }

    fn search_filesystem(&self, pattern: &Pattern, cwd: &str) -> Vec<Candidate> {
        search::search(&*self.fs, pattern, cwd, &self.matcher, &self.options.limits)
    }

    /// Add or refresh `target` in the history. Failing to identify its
    /// volume only costs the history entry.
    fn record(&mut self, target: &str) {
        match self.fs.volume_info(target) {
            Ok(volume) => {
                self.history.add_or_refresh_at(target, &volume, self.now);
            }
            Err(e) => debug!(target = %target, error = %e, "not recording, volume unknown"),
        }
    }
}

fn not_found(destination: &Destination) -> ResolveError {
    ResolveError::NotFound {
        destination: destination.text().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use jumpdir_core::VolumeInfo;
    use jumpdir_fs::MemoryFileSystem;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn vol() -> VolumeInfo {
        VolumeInfo::new("C:", "", 0)
    }

    fn resolve(
        fs: &mut MemoryFileSystem,
        history: &mut HistoryStore,
        raw: &str,
    ) -> Result<Resolution, ResolveError> {
        JumpResolver::new(fs, history, ResolveOptions::default())
            .at(t(1_000))
            .resolve(raw)
    }

    fn changed(target: &str) -> Resolution {
        Resolution::Changed {
            target: target.to_string(),
        }
    }

    #[test]
    fn empty_and_dot_leave_the_directory_alone() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        let mut history = HistoryStore::new();

        for raw in ["", ".", "  "] {
            let outcome = resolve(&mut fs, &mut history, raw).unwrap();
            assert_eq!(
                outcome,
                Resolution::Unchanged {
                    cwd: "C:/Users/x".to_string()
                }
            );
        }
        assert!(!history.is_dirty());
    }

    #[test]
    fn dot_relative_paths_bypass_history() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        fs.add_dir("C:/Users/x/sub").add_dir("C:/elsewhere/sub");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/elsewhere/sub", &vol(), t(0));
        history.mark_clean();

        let outcome = resolve(&mut fs, &mut history, "./sub").unwrap();
        assert_eq!(outcome, changed("C:/Users/x/sub"));

        let outcome = resolve(&mut fs, &mut history, "..").unwrap();
        assert_eq!(outcome, changed("C:/Users/x"));
        assert!(!history.is_dirty());
    }

    #[test]
    fn missing_dot_relative_path_is_not_found_even_with_history() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        fs.add_dir("C:/elsewhere/gone");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/elsewhere/gone", &vol(), t(0));

        let err = resolve(&mut fs, &mut history, "./gone").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
        assert_eq!(fs.current_dir().unwrap(), "C:/Users/x");
    }

    #[test]
    fn literal_child_is_entered_and_recorded() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        fs.add_dir("C:/Users/x/Projects");
        let mut history = HistoryStore::new();

        let outcome = resolve(&mut fs, &mut history, "projects").unwrap();
        assert_eq!(outcome, changed("C:/Users/x/Projects"));
        let recorded: Vec<&str> = history.entries().map(|e| e.path).collect();
        assert_eq!(recorded, vec!["C:/Users/x/Projects"]);
        assert_eq!(history.entries().next().unwrap().last_verified, t(1_000));
    }

    #[test]
    fn literal_naming_the_current_directory_is_unchanged() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        let mut history = HistoryStore::new();
        let outcome = resolve(&mut fs, &mut history, r"c:\users\X").unwrap();
        assert!(matches!(outcome, Resolution::Unchanged { .. }));
        assert!(history.is_empty());
    }

    #[test]
    fn work_is_found_through_history() {
        let mut fs = MemoryFileSystem::new("C:/Temp");
        fs.add_dir("C:/Users/x/work");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/Users/x/work", &vol(), t(0));

        let outcome = resolve(&mut fs, &mut history, "work").unwrap();
        assert_eq!(outcome, changed("C:/Users/x/work"));
        assert_eq!(fs.current_dir().unwrap(), "C:/Users/x/work");
        assert_eq!(history.entries().next().unwrap().last_verified, t(1_000));
    }

    #[test]
    fn unmatched_wildcard_is_not_found_and_commits_nothing() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        fs.add_dir("C:/Users/x/projects");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/Users/x/projects", &vol(), t(0));
        history.mark_clean();

        let err = resolve(&mut fs, &mut history, "doesnotexist*").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref destination } if destination == "doesnotexist*"));
        assert!(!history.is_dirty());
        assert_eq!(fs.current_dir().unwrap(), "C:/Users/x");
    }

    #[test]
    fn equal_rank_history_entries_pick_the_smaller_path() {
        let mut fs = MemoryFileSystem::new("C:/");
        fs.add_dir("C:/zeta/src").add_dir("C:/beta/src");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/zeta/src", &vol(), t(5));
        history.add_or_refresh_at("C:/beta/src", &vol(), t(5));
        history.add_or_refresh_at("C:/zeta/src", &vol(), t(5));

        for _ in 0..3 {
            fs.set_current_dir("C:/").unwrap();
            let outcome = JumpResolver::new(&mut fs, &mut history, ResolveOptions::default())
                .at(t(5))
                .resolve("src")
                .unwrap();
            assert_eq!(outcome, changed("C:/beta/src"));
        }
    }

    #[test]
    fn more_recent_entry_wins_among_equal_specificity() {
        let mut fs = MemoryFileSystem::new("C:/");
        fs.add_dir("C:/a/src").add_dir("C:/b/src");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/a/src", &vol(), t(1));
        history.add_or_refresh_at("C:/b/src", &vol(), t(2));

        let outcome = resolve(&mut fs, &mut history, "src").unwrap();
        assert_eq!(outcome, changed("C:/b/src"));
    }

    #[test]
    fn stale_history_entries_are_invalidated_on_success() {
        let mut fs = MemoryFileSystem::new("C:/");
        fs.add_dir("C:/here/work");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/here/work", &vol(), t(1));
        let gone = history.add_or_refresh_at("C:/gone/work", &vol(), t(2)).unwrap();

        let outcome = resolve(&mut fs, &mut history, "work").unwrap();
        assert_eq!(outcome, changed("C:/here/work"));
        assert!(!history.entry(gone).unwrap().valid);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn all_stale_history_falls_back_to_the_filesystem() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        fs.add_dir("C:/Users/x/projects");
        let mut history = HistoryStore::new();
        let gone = history.add_or_refresh_at("C:/old/projects", &vol(), t(0)).unwrap();

        let outcome = resolve(&mut fs, &mut history, "proj*").unwrap();
        assert_eq!(outcome, changed("C:/Users/x/projects"));
        assert!(!history.entry(gone).unwrap().valid);
        assert!(history.entries().any(|e| e.path == "C:/Users/x/projects"));
    }

    #[test]
    fn stale_entries_stay_when_resolution_fails() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        let mut history = HistoryStore::new();
        let gone = history.add_or_refresh_at("C:/old/projects", &vol(), t(0)).unwrap();
        history.mark_clean();

        let err = resolve(&mut fs, &mut history, "proj*").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
        assert!(history.entry(gone).unwrap().valid);
        assert!(!history.is_dirty());
    }

    #[test]
    fn case_variants_of_one_directory_resolve_to_a_single_entry() {
        let mut fs = MemoryFileSystem::new("C:/");
        fs.add_dir("C:/data/Src");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/data/Src", &vol(), t(3));
        history.add_or_refresh_at("C:/data/SRC", &vol(), t(3));
        history.mark_clean();
        assert_eq!(history.len(), 1);

        let outcome = resolve(&mut fs, &mut history, "src").unwrap();
        assert_eq!(outcome, changed("C:/data/SRC"));
        assert_eq!(history.len(), 1);
        assert!(history.is_dirty());
    }

    #[test]
    fn one_path_on_two_volumes_with_equal_rank_is_ambiguous() {
        let mut fs = MemoryFileSystem::new("C:/");
        fs.add_dir("C:/data/src");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/data/src", &VolumeInfo::new("C:", "old", 1), t(3));
        history.add_or_refresh_at("C:/data/src", &VolumeInfo::new("C:", "new", 2), t(3));
        history.mark_clean();

        let err = resolve(&mut fs, &mut history, "src").unwrap_err();
        match err {
            ResolveError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }
        assert!(!history.is_dirty());
        assert_eq!(fs.current_dir().unwrap(), "C:/");
    }

    #[test]
    fn wildcard_search_of_the_filesystem_records_the_winner() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        fs.add_dir("C:/Users/x/projects").add_dir("C:/Users/x/notes");
        let mut history = HistoryStore::new();

        let outcome = resolve(&mut fs, &mut history, "proj*").unwrap();
        assert_eq!(outcome, changed("C:/Users/x/projects"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn dot_relative_wildcard_stays_under_the_current_directory() {
        let mut fs = MemoryFileSystem::new("C:/Users/x");
        fs.add_dir("C:/Users/x/projects2").add_dir("C:/other/projects");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/other/projects", &vol(), t(0));

        let outcome = resolve(&mut fs, &mut history, "./proj*").unwrap();
        assert_eq!(outcome, changed("C:/Users/x/projects2"));
    }

    #[test]
    fn literal_intent_beats_a_more_recent_glob_match() {
        let mut fs = MemoryFileSystem::new("C:/");
        fs.add_dir("C:/a/src").add_dir("C:/b/srcs");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/a/src", &vol(), t(0));
        history.add_or_refresh_at("C:/b/srcs", &vol(), t(9));

        // "src" matches only the first. "src*" matches both as Glob, and the
        // first resolve just refreshed C:/a/src.
        assert_eq!(resolve(&mut fs, &mut history, "src").unwrap(), changed("C:/a/src"));
        fs.set_current_dir("C:/").unwrap();
        assert_eq!(resolve(&mut fs, &mut history, "src*").unwrap(), changed("C:/a/src"));
    }

    #[test]
    fn suffix_search_uses_history_first() {
        let mut fs = MemoryFileSystem::new("C:/");
        fs.add_dir("C:/code/app/src").add_dir("C:/code/lib/src");
        let mut history = HistoryStore::new();
        history.add_or_refresh_at("C:/code/app/src", &vol(), t(0));
        history.add_or_refresh_at("C:/code/lib/src", &vol(), t(1));

        let outcome = resolve(&mut fs, &mut history, ".../app/src").unwrap();
        assert_eq!(outcome, changed("C:/code/app/src"));
    }

    #[test]
    fn network_search_flag_comes_from_the_header() {
        let header = HistoryHeader {
            net_search: false,
            ..HistoryHeader::default()
        };
        let options = ResolveOptions::from_header(&header, 3);
        assert!(!options.limits.net_search);
        assert_eq!(options.limits.max_depth, 3);

        let mut fs = MemoryFileSystem::new("//srv/share");
        fs.add_dir("//srv/share/docs");
        let mut history = HistoryStore::new();
        let err = JumpResolver::new(&mut fs, &mut history, options)
            .resolve("do*")
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }
}

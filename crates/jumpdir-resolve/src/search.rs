//! Live filesystem traversal, used when history has nothing to offer.
//!
//! Relative and rooted patterns are walked segment by segment from their
//! starting directory, listing only directories the pattern can still
//! reach. `**` descends up to the depth limit. Suffix patterns (`...`)
//! scan breadth-first from the volume root instead.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use jumpdir_core::path;
use jumpdir_fs::FileSystem;
use jumpdir_pattern::{Anchor, Pattern, Segment, Specificity, WildcardMatcher};

use crate::candidate::{Candidate, Source};

/// Bounds on a single traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Levels a `**` or a suffix scan may descend.
    pub max_depth: usize,
    /// Directories that may be listed in total.
    pub max_dirs: usize,
    /// Whether network (UNC) roots may be traversed.
    pub net_search: bool,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_dirs: 10_000,
            net_search: true,
        }
    }
}

/// Every directory reachable from `cwd` (or the pattern's root) that
/// matches `pattern`, unranked and without duplicates.
pub fn search<F: FileSystem + ?Sized>(
    fs: &F,
    pattern: &Pattern,
    cwd: &str,
    matcher: &WildcardMatcher,
    limits: &SearchLimits,
) -> Vec<Candidate> {
    let start = match &pattern.anchor {
        Anchor::Rooted(root) => root.clone(),
        Anchor::Relative => cwd.to_string(),
        Anchor::Suffix => match path::root_of(cwd) {
            Some(root) => root,
            None => return Vec::new(),
        },
    };
    if path::is_network(&start) && !limits.net_search {
        debug!(root = %start, "network search disabled, skipping traversal");
        return Vec::new();
    }

    let mut walker = Walker {
        fs,
        matcher,
        limits,
        listings: HashMap::new(),
        exhausted: false,
        found: Vec::new(),
        found_paths: HashSet::new(),
    };
    match pattern.anchor {
        Anchor::Suffix => walker.scan(pattern, &start),
        Anchor::Rooted(_) | Anchor::Relative => walker.walk(pattern, &start),
    }

    debug!(
        pattern = %pattern,
        start = %start,
        listed = walker.listings.len(),
        found = walker.found.len(),
        "filesystem search finished"
    );
    walker.found
}

struct Walker<'a, F: ?Sized> {
    fs: &'a F,
    matcher: &'a WildcardMatcher,
    limits: &'a SearchLimits,
    /// Subdirectory names per listed directory (keyed case-folded).
    listings: HashMap<String, Vec<String>>,
    exhausted: bool,
    found: Vec<Candidate>,
    found_paths: HashSet<String>,
}

impl<F: FileSystem + ?Sized> Walker<'_, F> {
    fn walk(&mut self, pattern: &Pattern, start: &str) {
        let strict = WildcardMatcher::case_sensitive();
        let class = pattern.class();
        let segments = &pattern.segments;

        // (directory, next segment, `**` depth used, literal parts matched in exact case)
        let mut queue = VecDeque::from([(start.to_string(), 0usize, 0usize, true)]);
        let mut seen = HashSet::new();

        while let Some((dir, idx, depth, exact)) = queue.pop_front() {
            if !seen.insert((path::fold_case(&dir), idx, depth, exact)) {
                continue;
            }
            let Some(segment) = segments.get(idx) else {
                self.push(dir, Specificity { class, exact_case: exact });
                continue;
            };
            match segment {
                Segment::AnyDepth => {
                    queue.push_back((dir.clone(), idx + 1, depth, exact));
                    if depth < self.limits.max_depth {
                        for name in self.subdirectories(&dir) {
                            queue.push_back((path::child(&dir, &name), idx, depth + 1, exact));
                        }
                    }
                }
                Segment::Parent => {
                    if let Some(up) = path::parent(&dir) {
                        queue.push_back((up, idx + 1, depth, exact));
                    }
                }
                Segment::Literal(_) | Segment::Glob(_) => {
                    for name in self.subdirectories(&dir) {
                        if !self.matcher.segment_accepts(segment, &name) {
                            continue;
                        }
                        let exact = exact && strict.segment_accepts(segment, &name);
                        queue.push_back((path::child(&dir, &name), idx + 1, depth, exact));
                    }
                }
            }
        }
    }

    fn scan(&mut self, pattern: &Pattern, root: &str) {
        let mut queue = VecDeque::from([(root.to_string(), 0usize)]);
        while let Some((dir, depth)) = queue.pop_front() {
            if let Some(specificity) = self.matcher.match_path(pattern, &dir) {
                self.push(dir.clone(), specificity);
            }
            if depth < self.limits.max_depth {
                for name in self.subdirectories(&dir) {
                    queue.push_back((path::child(&dir, &name), depth + 1));
                }
            }
        }
    }

    fn push(&mut self, dir: String, specificity: Specificity) {
        if self.found_paths.insert(dir.clone()) {
            self.found.push(Candidate {
                path: dir,
                specificity,
                last_verified: None,
                source: Source::Filesystem,
            });
        }
    }

    fn subdirectories(&mut self, dir: &str) -> Vec<String> {
        let key = path::fold_case(dir);
        if let Some(names) = self.listings.get(&key) {
            return names.clone();
        }
        if self.listings.len() >= self.limits.max_dirs {
            if !self.exhausted {
                debug!(limit = self.limits.max_dirs, "directory budget exhausted, search truncated");
                self.exhausted = true;
            }
            return Vec::new();
        }
        let names = self.fs.subdirectories(dir);
        self.listings.insert(key, names.clone());
        names
    }
}

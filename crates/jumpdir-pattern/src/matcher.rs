//! Wildcard matching of patterns against path segments.

use jumpdir_core::path;

use crate::ast::{Anchor, Pattern, Segment, Specificity};
use crate::parser;

/// Evaluates [`Pattern`]s against candidate paths.
///
/// Comparison is case-insensitive by default: directory names are
/// case-preserving on disk but compared without regard to case.
#[derive(Debug, Clone, Copy, Default)]
pub struct WildcardMatcher {
    case_sensitive: bool,
}

impl WildcardMatcher {
    /// A case-insensitive matcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A matcher that distinguishes letter case.
    #[must_use]
    pub fn case_sensitive() -> Self {
        Self {
            case_sensitive: true,
        }
    }

    /// Match a raw pattern string against a candidate path.
    ///
    /// Convenience over [`parser::parse`] + [`Self::match_path`].
    #[must_use]
    pub fn matches(&self, pattern: &str, candidate: &str) -> Option<Specificity> {
        self.match_path(&parser::parse(pattern), candidate)
    }

    /// Match a pattern against a whole path the way the history is searched.
    ///
    /// Rooted patterns must cover the path from its root. Relative and suffix
    /// patterns match any trailing run of the path's segments.
    #[must_use]
    pub fn match_path(&self, pattern: &Pattern, candidate: &str) -> Option<Specificity> {
        let normalized = path::normalize(candidate);
        let segments = path::segments(&normalized);

        let matched = match &pattern.anchor {
            Anchor::Rooted(root) => {
                let same_root = path::root_of(&normalized).is_some_and(|r| self.text_eq(&r, root));
                same_root && self.match_segments(&pattern.segments, &segments)
            }
            Anchor::Relative | Anchor::Suffix => self.match_suffix(&pattern.segments, &segments),
        };

        matched.then(|| self.specificity(pattern, &segments))
    }

    /// Match one pattern segment (`?`/`*` allowed) against one name.
    #[must_use]
    pub fn match_segment(&self, pattern: &str, candidate: &str) -> bool {
        let p = self.fold(pattern);
        let c = self.fold(candidate);
        glob(&p, &c)
    }

    /// True if `segment` accepts the entry `name`. [`Segment::AnyDepth`]
    /// accepts everything.
    #[must_use]
    pub fn segment_accepts(&self, segment: &Segment, name: &str) -> bool {
        match segment {
            Segment::Literal(s) => self.text_eq(s, name),
            Segment::Glob(s) => self.match_segment(s, name),
            Segment::AnyDepth => true,
            Segment::Parent => name == "..",
        }
    }

    fn match_segments(&self, pattern: &[Segment], candidate: &[&str]) -> bool {
        match pattern.split_first() {
            None => candidate.is_empty(),
            Some((Segment::AnyDepth, rest)) => {
                (0..=candidate.len()).any(|skip| self.match_segments(rest, &candidate[skip..]))
            }
            Some((segment, rest)) => match candidate.split_first() {
                Some((name, tail)) => {
                    self.segment_accepts(segment, name) && self.match_segments(rest, tail)
                }
                None => false,
            },
        }
    }

    fn match_suffix(&self, pattern: &[Segment], candidate: &[&str]) -> bool {
        (0..=candidate.len()).any(|start| self.match_segments(pattern, &candidate[start..]))
    }

    fn specificity(&self, pattern: &Pattern, candidate: &[&str]) -> Specificity {
        let exact_case = self.case_sensitive || {
            let strict = Self::case_sensitive();
            match pattern.anchor {
                Anchor::Rooted(_) => strict.match_segments(&pattern.segments, candidate),
                Anchor::Relative | Anchor::Suffix => {
                    strict.match_suffix(&pattern.segments, candidate)
                }
            }
        };
        Specificity {
            class: pattern.class(),
            exact_case,
        }
    }

    fn text_eq(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            path::eq_ignore_case(a, b)
        }
    }

    fn fold(&self, s: &str) -> Vec<char> {
        if self.case_sensitive {
            s.chars().collect()
        } else {
            path::fold_case(s).chars().collect()
        }
    }
}

/// Glob match with `?` and `*` over a single segment, anchored at both ends.
fn glob(pattern: &[char], candidate: &[char]) -> bool {
    let (mut p, mut c) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while c < candidate.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == candidate[c]) {
            p += 1;
            c += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            resume = c;
            p += 1;
        } else if let Some(s) = star {
            p = s + 1;
            resume += 1;
            c = resume;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&ch| ch == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MatchClass;
    use proptest::prelude::*;

    #[test]
    fn star_matches_within_a_segment() {
        let m = WildcardMatcher::new();
        let spec = m.matches("proj*", "projects").expect("should match");
        assert_eq!(spec.class, MatchClass::Glob);
        assert!(m.matches("proj*", "other").is_none());
    }

    #[test]
    fn question_mark_is_exactly_one_character() {
        let m = WildcardMatcher::new();
        assert!(m.matches("a?c", "abc").is_some());
        assert!(m.matches("a?c", "abcd").is_none());
        assert!(m.matches("a?c", "ac").is_none());
    }

    #[test]
    fn double_star_crosses_separators() {
        let m = WildcardMatcher::new();
        let spec = m.matches("**/src", "a/b/src").expect("should match");
        assert_eq!(spec.class, MatchClass::Broad);
        assert!(m.matches("/a/**/src", "/a/src").is_some());
        assert!(m.matches("/a/**/src", "/a/b/c/src").is_some());
        assert!(m.matches("/a/**/src", "/b/src").is_none());
    }

    #[test]
    fn single_star_does_not_cross_separators() {
        let m = WildcardMatcher::new();
        assert!(m.matches("/a/*", "/a/b/c").is_none());
        assert!(m.matches("/a/*", "/a/b").is_some());
    }

    #[test]
    fn matching_ignores_case_but_ranks_exact_case_higher() {
        let m = WildcardMatcher::new();
        let folded = m.matches("Work", "/home/x/work").expect("folded match");
        let exact = m.matches("work", "/home/x/work").expect("exact match");
        assert_eq!(folded.class, MatchClass::Literal);
        assert!(!folded.exact_case);
        assert!(exact.exact_case);
        assert!(exact > folded);
    }

    #[test]
    fn case_sensitive_matcher_rejects_case_mismatch() {
        let m = WildcardMatcher::case_sensitive();
        assert!(m.matches("Work", "/home/x/work").is_none());
        assert!(m.match_segment("W*", "Work"));
    }

    #[test]
    fn relative_patterns_match_trailing_segments() {
        let m = WildcardMatcher::new();
        assert!(m.matches("work", "C:/Users/x/work").is_some());
        assert!(m.matches("x/work", "C:/Users/x/work").is_some());
        assert!(m.matches("Users/work", "C:/Users/x/work").is_none());
    }

    #[test]
    fn rooted_patterns_require_the_same_root() {
        let m = WildcardMatcher::new();
        assert!(m.matches("c:/users/*/work", "C:/Users/x/work").is_some());
        assert!(m.matches("D:/Users/*/work", "C:/Users/x/work").is_none());
        assert!(m.matches("/users/x", "/home/users/x").is_none());
    }

    #[test]
    fn suffix_search_ranks_lowest() {
        let m = WildcardMatcher::new();
        let spec = m.matches(".../src/lib", "/repo/crate/src/lib").expect("suffix");
        assert_eq!(spec.class, MatchClass::Broad);
        assert!(m.matches(".../src", "/repo/src/lib").is_none());
        assert!(m.matches("...", "/anything/at/all").is_some());
    }

    #[test]
    fn rooted_matching_covers_all_segments() {
        let m = WildcardMatcher::new();
        assert!(m.matches("/proj*/src", "/projects/src").is_some());
        assert!(m.matches("/proj*/src", "/x/projects/src").is_none());
    }

    #[test]
    fn glob_handles_leading_and_repeated_stars() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert!(glob(&chars("*"), &chars("")));
        assert!(glob(&chars("*a*b"), &chars("xxaxxb")));
        assert!(!glob(&chars("*a*b"), &chars("xxaxxbc")));
        assert!(glob(&chars("a**"), &chars("abc")));
    }

    proptest! {
        #[test]
        fn literal_name_always_matches_itself(name in "[a-zA-Z0-9_]{1,16}") {
            let m = WildcardMatcher::new();
            prop_assert!(m.match_segment(&name, &name));
            prop_assert!(m.match_segment(&name.to_uppercase(), &name));
        }

        #[test]
        fn appending_a_character_breaks_a_literal_match(name in "[a-z]{1,12}", extra in "[a-z]") {
            let m = WildcardMatcher::new();
            let longer = format!("{name}{extra}");
            prop_assert!(!m.match_segment(&name, &longer));
            let star = format!("{name}*");
            prop_assert!(m.match_segment(&star, &longer));
        }
    }
}

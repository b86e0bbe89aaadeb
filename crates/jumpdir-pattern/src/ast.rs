//! AST types for parsed destination patterns.
//!
//! A pattern is produced by [`crate::parser`] and consumed by the
//! [`crate::matcher::WildcardMatcher`].

/// Where a pattern's first segment is pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// Starts at a filesystem root (`/`, `C:/`, `//server/share`).
    Rooted(String),
    /// No root. Matched as a trailing run of segments against history, and
    /// from the current directory during a filesystem search.
    Relative,
    /// `...` prefix: any known directory whose path ends with the segments.
    Suffix,
}

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain name, compared case-insensitively.
    Literal(String),
    /// Name containing `?` or `*`; never crosses a separator.
    Glob(String),
    /// `**`: zero or more whole segments.
    AnyDepth,
    /// `..` that could not be resolved lexically.
    Parent,
}

impl Segment {
    /// True for segments that match by wildcard rather than by name.
    #[must_use]
    pub fn is_wild(&self) -> bool {
        matches!(self, Self::Glob(_) | Self::AnyDepth)
    }
}

/// How literal a pattern is. Later variants rank higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchClass {
    /// Uses `**` or the `...` suffix marker.
    Broad,
    /// Uses `?` or `*` only.
    Glob,
    /// No wildcards at all.
    Literal,
}

/// Ranking of a single successful match. Compares class first, then whether
/// the literal parts also matched with exact case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    pub class: MatchClass,
    pub exact_case: bool,
}

/// A parsed destination pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub source: String,
    pub anchor: Anchor,
    pub segments: Vec<Segment>,
}

impl Pattern {
    /// The specificity class implied by the pattern's shape.
    #[must_use]
    pub fn class(&self) -> MatchClass {
        if self.anchor == Anchor::Suffix || self.segments.contains(&Segment::AnyDepth) {
            MatchClass::Broad
        } else if self.segments.iter().any(Segment::is_wild) {
            MatchClass::Glob
        } else {
            MatchClass::Literal
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(s) | Self::Glob(s) => write!(f, "{s}"),
            Self::AnyDepth => write!(f, "**"),
            Self::Parent => write!(f, ".."),
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = self
            .segments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        match &self.anchor {
            Anchor::Rooted(root) if root.ends_with('/') => write!(f, "{root}{body}"),
            Anchor::Rooted(root) if body.is_empty() => write!(f, "{root}"),
            Anchor::Rooted(root) => write!(f, "{root}/{body}"),
            Anchor::Relative => write!(f, "{body}"),
            Anchor::Suffix => write!(f, ".../{body}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(anchor: Anchor, segments: Vec<Segment>) -> Pattern {
        Pattern {
            source: String::new(),
            anchor,
            segments,
        }
    }

    #[test]
    fn class_ranks_literal_over_glob_over_broad() {
        assert!(MatchClass::Literal > MatchClass::Glob);
        assert!(MatchClass::Glob > MatchClass::Broad);

        let literal = pattern(Anchor::Relative, vec![Segment::Literal("work".into())]);
        let glob = pattern(Anchor::Relative, vec![Segment::Glob("w*".into())]);
        let deep = pattern(
            Anchor::Relative,
            vec![Segment::AnyDepth, Segment::Literal("src".into())],
        );
        let suffix = pattern(Anchor::Suffix, vec![Segment::Literal("src".into())]);

        assert_eq!(literal.class(), MatchClass::Literal);
        assert_eq!(glob.class(), MatchClass::Glob);
        assert_eq!(deep.class(), MatchClass::Broad);
        assert_eq!(suffix.class(), MatchClass::Broad);
    }

    #[test]
    fn specificity_prefers_exact_case_within_a_class() {
        let exact = Specificity {
            class: MatchClass::Glob,
            exact_case: true,
        };
        let folded = Specificity {
            class: MatchClass::Glob,
            exact_case: false,
        };
        let literal = Specificity {
            class: MatchClass::Literal,
            exact_case: false,
        };
        assert!(exact > folded);
        assert!(literal > exact);
    }

    #[test]
    fn display_renders_anchor_and_segments() {
        let rooted = pattern(
            Anchor::Rooted("/".into()),
            vec![Segment::Literal("home".into()), Segment::Glob("p*".into())],
        );
        assert_eq!(rooted.to_string(), "/home/p*");

        let unc = pattern(
            Anchor::Rooted("//srv/share".into()),
            vec![Segment::AnyDepth],
        );
        assert_eq!(unc.to_string(), "//srv/share/**");

        let suffix = pattern(Anchor::Suffix, vec![Segment::Literal("src".into())]);
        assert_eq!(suffix.to_string(), ".../src");
    }
}

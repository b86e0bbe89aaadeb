//! Destination string → [`Pattern`].
//!
//! Grammar, per `/`-separated segment:
//! - `?` one character, `*` any run of characters within the segment
//! - `**` (any run of two or more stars alone in a segment) spans whole segments
//! - a leading `...` on the whole string selects a suffix search
//!
//! Backslashes are accepted as separators.

use jumpdir_core::path;

use crate::ast::{Anchor, Pattern, Segment};

/// Parse a destination into a pattern without reference to any directory.
///
/// Patterns that begin with `./` or `../` stay [`Anchor::Relative`] with their
/// leading `..` kept as [`Segment::Parent`]; use [`parse_in`] to pin them.
#[must_use]
pub fn parse(raw: &str) -> Pattern {
    let text = raw.replace('\\', "/");

    if let Some(rest) = text.strip_prefix("...") {
        return Pattern {
            source: raw.to_string(),
            anchor: Anchor::Suffix,
            segments: resolve_parents(split_segments(rest), false),
        };
    }

    match path::root_of(&text) {
        Some(root) => Pattern {
            source: raw.to_string(),
            anchor: Anchor::Rooted(root),
            segments: resolve_parents(split_segments(&body_after_root(&text)), true),
        },
        None => Pattern {
            source: raw.to_string(),
            anchor: Anchor::Relative,
            segments: resolve_parents(split_segments(&text), false),
        },
    }
}

/// Parse a destination, pinning explicitly dot-relative patterns (`./x*`,
/// `../x*`) to `cwd` so they never widen into a history-wide search.
#[must_use]
pub fn parse_in(raw: &str, cwd: &str) -> Pattern {
    let mut pattern = parse(raw);
    if pattern.anchor != Anchor::Relative || !is_dot_relative(raw) {
        return pattern;
    }
    let Some(root) = path::root_of(cwd) else {
        return pattern;
    };

    let mut segments: Vec<Segment> = path::segments(cwd)
        .into_iter()
        .map(|s| Segment::Literal(s.to_string()))
        .collect();
    segments.append(&mut pattern.segments);

    pattern.anchor = Anchor::Rooted(root);
    pattern.segments = resolve_parents(segments, true);
    pattern
}

fn is_dot_relative(raw: &str) -> bool {
    let text = raw.replace('\\', "/");
    let first = text.split('/').next().unwrap_or_default();
    first == "." || first == ".."
}

fn body_after_root(text: &str) -> String {
    // path::segments knows every root form; rejoin what follows it.
    path::segments(text).join("/")
}

fn split_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for piece in text.split('/') {
        let segment = match piece {
            "" | "." => continue,
            ".." => Segment::Parent,
            s if s.len() >= 2 && s.chars().all(|c| c == '*') => Segment::AnyDepth,
            s if s.contains(['?', '*']) => Segment::Glob(s.to_string()),
            s => Segment::Literal(s.to_string()),
        };
        if segment == Segment::AnyDepth && segments.last() == Some(&Segment::AnyDepth) {
            continue;
        }
        segments.push(segment);
    }
    segments
}

/// Fold `..` into the preceding segment. Under a root a `..` with nothing to
/// fold is dropped; otherwise it is kept.
fn resolve_parents(segments: Vec<Segment>, rooted: bool) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment != Segment::Parent {
            out.push(segment);
            continue;
        }
        match out.last() {
            Some(Segment::Literal(_) | Segment::Glob(_)) => {
                out.pop();
            }
            _ if rooted && out.is_empty() => {}
            _ => out.push(Segment::Parent),
        }
    }
    out
}

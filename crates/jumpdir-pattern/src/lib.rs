//! # jumpdir-pattern
//!
//! Destination patterns for jumpdir: `?` and `*` within a segment, `**`
//! across segments, and the `...` suffix-search marker.
//!
//! Parses destination strings into a [`Pattern`] AST and evaluates it with
//! the [`WildcardMatcher`], which reports a [`Specificity`] for every match.

pub mod ast;
pub mod matcher;
pub mod parser;

pub use ast::{Anchor, MatchClass, Pattern, Segment, Specificity};
pub use matcher::WildcardMatcher;
pub use parser::{parse, parse_in};

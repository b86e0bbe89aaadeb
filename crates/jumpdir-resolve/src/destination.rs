//! Classification of the raw destination string.

/// What kind of request a destination string makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    /// Nothing given: report the current directory.
    Empty,
    /// Exactly `.`.
    Current,
    /// `./...`, `..` or `../...` without wildcards: a literal relative path
    /// that never goes through history or search.
    DotRelative,
    /// A plain path, tried directly before any search.
    Literal,
    /// Contains `?`, `*`, or a leading `...`.
    Wild,
}

/// A destination as typed, with its separators unified to `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    text: String,
    kind: DestinationKind,
}

impl Destination {
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let text = raw.replace('\\', "/");
        let kind = if text.trim().is_empty() {
            DestinationKind::Empty
        } else if text == "." {
            DestinationKind::Current
        } else if text.starts_with("...") || text.contains(['?', '*']) {
            DestinationKind::Wild
        } else if text.starts_with("./") || text == ".." || text.starts_with("../") {
            DestinationKind::DotRelative
        } else {
            DestinationKind::Literal
        };
        Self { text, kind }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> DestinationKind {
        self.kind
    }

    /// Resolved without any history lookup or search.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        matches!(
            self.kind,
            DestinationKind::Empty | DestinationKind::Current | DestinationKind::DotRelative
        )
    }
}

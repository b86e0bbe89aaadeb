//! Normalized path strings.
//!
//! Every path that enters the history or is compared by the resolver is kept
//! in one canonical textual form:
//! - separators are `/`
//! - repeated separators collapse, except for a leading `//` UNC prefix
//! - `.` segments are dropped and `..` is resolved lexically, never above the root
//! - no trailing separator except on a bare root (`/`, `C:/`)
//!
//! Comparison between paths is case-insensitive; storage is case-preserving.

/// The root portion of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Root {
    None,
    Slash,
    Drive(char),
    Unc(String),
}

impl Root {
    fn render(&self, body: &str) -> String {
        match self {
            Self::None if body.is_empty() => ".".to_string(),
            Self::None => body.to_string(),
            Self::Slash => format!("/{body}"),
            Self::Drive(letter) => format!("{letter}:/{body}"),
            Self::Unc(prefix) if body.is_empty() => prefix.clone(),
            Self::Unc(prefix) => format!("{prefix}/{body}"),
        }
    }
}

fn split_root(slashed: &str) -> (Root, &str) {
    if let Some(rest) = slashed.strip_prefix("//") {
        let rest = rest.trim_start_matches('/');
        let mut parts = rest.splitn(3, '/');
        let server = parts.next().unwrap_or_default();
        let share = parts.next().unwrap_or_default();
        let tail = parts.next().unwrap_or_default();
        let prefix = if share.is_empty() {
            format!("//{server}")
        } else {
            format!("//{server}/{share}")
        };
        return (Root::Unc(prefix), tail);
    }

    let bytes = slashed.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let letter = char::from(bytes[0].to_ascii_uppercase());
        return (Root::Drive(letter), &slashed[2..]);
    }

    match slashed.strip_prefix('/') {
        Some(rest) => (Root::Slash, rest),
        None => (Root::None, slashed),
    }
}

/// Normalize a raw path string into canonical form.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let slashed = raw.replace('\\', "/");
    let (root, rest) = split_root(&slashed);

    let mut parts: Vec<&str> = Vec::new();
    for seg in rest.split('/') {
        match seg {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // Relative paths keep leading `..`; rooted paths clamp at the root.
                _ if root == Root::None => parts.push(".."),
                _ => {}
            },
            other => parts.push(other),
        }
    }

    root.render(&parts.join("/"))
}

/// True if the path carries a root (`/`, a drive letter, or a UNC prefix).
#[must_use]
pub fn is_absolute(path: &str) -> bool {
    let slashed = path.replace('\\', "/");
    split_root(&slashed).0 != Root::None
}

/// True if the path is a UNC network path (`//server/share/...`).
#[must_use]
pub fn is_network(path: &str) -> bool {
    let slashed = path.replace('\\', "/");
    matches!(split_root(&slashed).0, Root::Unc(_))
}

/// The root of an absolute path in normalized form, or `None` for a relative path.
#[must_use]
pub fn root_of(path: &str) -> Option<String> {
    let slashed = path.replace('\\', "/");
    match split_root(&slashed).0 {
        Root::None => None,
        root => Some(root.render("")),
    }
}

/// Join `rel` onto `base`. An absolute `rel` replaces `base` entirely.
#[must_use]
pub fn join(base: &str, rel: &str) -> String {
    if is_absolute(rel) {
        normalize(rel)
    } else {
        normalize(&format!("{base}/{rel}"))
    }
}

/// Append a single entry name to an already-normalized directory path.
#[must_use]
pub fn child(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// The segments after the root of a normalized path.
#[must_use]
pub fn segments(path: &str) -> Vec<&str> {
    let (_, rest) = split_root(path);
    rest.split('/').filter(|s| !s.is_empty() && *s != ".").collect()
}

/// Parent directory of a normalized path, or `None` at a root.
#[must_use]
pub fn parent(path: &str) -> Option<String> {
    let (root, rest) = split_root(path);
    let mut parts: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    parts.pop()?;
    Some(root.render(&parts.join("/")))
}

/// Case-insensitive path equality.
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    fold_case(a) == fold_case(b)
}

/// Lowercase form used for every case-insensitive comparison.
#[must_use]
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Path of `path` relative to `base`, compared case-insensitively.
///
/// Returns `None` when `path` is not `base` or one of its descendants, and an
/// empty string when they are equal.
#[must_use]
pub fn relative_to(path: &str, base: &str) -> Option<String> {
    if root_of(path).map(|r| fold_case(&r)) != root_of(base).map(|r| fold_case(&r)) {
        return None;
    }
    let path_segs = segments(path);
    let base_segs = segments(base);
    if base_segs.len() > path_segs.len() {
        return None;
    }
    let shared = path_segs
        .iter()
        .zip(&base_segs)
        .all(|(p, b)| eq_ignore_case(p, b));
    shared.then(|| path_segs[base_segs.len()..].join("/"))
}

/// Render a normalized path with the separator a shell flavor expects.
#[must_use]
pub fn to_native(path: &str, backslash: bool) -> String {
    if backslash {
        path.replace('/', "\\")
    } else {
        path.to_string()
    }
}

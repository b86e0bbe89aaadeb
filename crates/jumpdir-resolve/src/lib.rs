//! # jumpdir-resolve
//!
//! Turns a destination string into a directory.
//!
//! [`JumpResolver`] runs the whole request: trivial shortcuts, a direct
//! change for plain paths, then history lookup and filesystem search with
//! deterministic tie-breaking ([`candidate`]).

pub mod candidate;
pub mod destination;
pub mod resolver;
pub mod search;

pub use candidate::{Candidate, Source};
pub use destination::{Destination, DestinationKind};
pub use resolver::{JumpResolver, Resolution, ResolveOptions};
pub use search::SearchLimits;

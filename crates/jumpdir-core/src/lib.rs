//! # jumpdir-core
//!
//! Core types shared by every jumpdir crate:
//! - [`HistoryEntry`], [`HistoryHeader`], [`VolumeInfo`]: the history data model
//! - [`path`]: canonical path strings and case-insensitive comparison
//! - [`JumpConfig`]: per-invocation configuration
//! - Error hierarchy ([`JumpError`], [`HistoryError`], [`FsError`], [`ResolveError`])

pub mod config;
pub mod entry;
pub mod error;
pub mod path;

pub use config::{JumpConfig, ShellFlavor};
pub use entry::{EntryId, HistoryEntry, HistoryHeader, VolumeInfo};
pub use error::{FsError, HistoryError, JumpError, ResolveError, Result};

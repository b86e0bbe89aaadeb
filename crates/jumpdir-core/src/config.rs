//! Runtime configuration assembled from the environment and command line.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::JumpError;

/// Environment variable overriding the history file location.
pub const JUMPDATA_VAR: &str = "JUMPDATA";
/// Name of the history file inside the user profile directory.
pub const HISTORY_FILE_NAME: &str = "jumpdir.dat";

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2000);
const DEFAULT_SEARCH_DEPTH: usize = 8;

/// Syntax of the commands written to standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    /// `sh`, `bash`, `zsh` and friends.
    Posix,
    /// Windows `cmd.exe`.
    Cmd,
}

impl ShellFlavor {
    /// The flavor native to the platform this binary was built for.
    #[must_use]
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Cmd
        } else {
            Self::Posix
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "posix" | "sh" | "bash" | "zsh" => Some(Self::Posix),
            "cmd" => Some(Self::Cmd),
            _ => None,
        }
    }
}

/// Everything a single invocation needs beyond the destination string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpConfig {
    /// Emit diagnostic tracing to the error stream.
    pub debug: bool,
    pub history_path: PathBuf,
    pub lock_timeout: Duration,
    pub shell: ShellFlavor,
    /// Depth limit for live filesystem traversal.
    pub search_depth: usize,
}

impl JumpConfig {
    /// Build a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`JumpError::Config`] if no history location can be determined
    /// or a variable holds an unusable value.
    pub fn from_env(debug: bool) -> Result<Self, JumpError> {
        Self::from_lookup(debug, |key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`JumpError::Config`] if no history location can be determined
    /// or a variable holds an unusable value.
    pub fn from_lookup<F>(debug: bool, lookup: F) -> Result<Self, JumpError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let history_path = match non_empty(JUMPDATA_VAR) {
            Some(path) => PathBuf::from(path),
            None => {
                let profile = non_empty("USERPROFILE")
                    .or_else(|| non_empty("HOME"))
                    .ok_or_else(|| {
                        JumpError::Config(
                            "cannot locate jumpdir.dat: neither JUMPDATA nor USERPROFILE/HOME is defined"
                                .to_string(),
                        )
                    })?;
                PathBuf::from(profile).join(HISTORY_FILE_NAME)
            }
        };

        let shell = match non_empty("JUMPDIR_SHELL") {
            Some(value) => ShellFlavor::parse(&value).ok_or_else(|| {
                JumpError::Config(format!("unknown JUMPDIR_SHELL value '{value}'"))
            })?,
            None => ShellFlavor::platform_default(),
        };

        let lock_timeout = match non_empty("JUMPDIR_LOCK_TIMEOUT_MS") {
            Some(value) => Duration::from_millis(parse_number(&value, "JUMPDIR_LOCK_TIMEOUT_MS")?),
            None => DEFAULT_LOCK_TIMEOUT,
        };

        let search_depth = match non_empty("JUMPDIR_SEARCH_DEPTH") {
            Some(value) => usize::try_from(parse_number(&value, "JUMPDIR_SEARCH_DEPTH")?)
                .map_err(|e| JumpError::Config(format!("JUMPDIR_SEARCH_DEPTH: {e}")))?,
            None => DEFAULT_SEARCH_DEPTH,
        };

        Ok(Self {
            debug,
            history_path,
            lock_timeout,
            shell,
            search_depth,
        })
    }

    /// Companion lock file guarding load-modify-store of the history.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.history_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }
}

fn parse_number(value: &str, key: &str) -> Result<u64, JumpError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| JumpError::Config(format!("{key}='{value}': {e}")))
}

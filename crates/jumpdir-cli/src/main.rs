//! jumpdir: adaptive directory navigation for the command line.
//!
//! The binary prints shell commands on stdout; a shell wrapper evaluates
//! them, since a child process cannot change its parent's directory.
//! Diagnostics go to stderr and only with `-d`.

mod args;
mod shell;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn};

use jumpdir_core::{HistoryError, JumpConfig, JumpError, ResolveError, ShellFlavor};
use jumpdir_fs::StdFileSystem;
use jumpdir_history::{HistoryLock, HistoryStore};
use jumpdir_resolve::{JumpResolver, ResolveOptions};

use crate::args::Cli;
use crate::shell::ShellEmitter;

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.iter().any(|a| args::is_help(a)) {
        let flavor = JumpConfig::from_env(false)
            .map(|c| c.shell)
            .unwrap_or_else(|_| ShellFlavor::platform_default());
        print_lines(&ShellEmitter::plain(flavor).echo_lines(args::USAGE.iter().copied()));
        return ExitCode::SUCCESS;
    }

    let cli = match Cli::try_parse_from(std::iter::once("jumpdir".to_string()).chain(raw)) {
        Ok(cli) => cli,
        Err(e) => {
            let message = e.to_string();
            let first = message.lines().next().unwrap_or_default();
            let usage = JumpError::Usage(first.trim_start_matches("error: ").to_string());
            return report(&anyhow::Error::from(usage));
        }
    };
    init_tracing(cli.debug);

    match run(&cli) {
        Ok(lines) => {
            print_lines(&lines);
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn init_tracing(debug: bool) {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    // Only fails if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let config = JumpConfig::from_env(cli.debug).context("reading configuration")?;
    let destination = cli.destination();
    debug!(destination = %destination, history = %config.history_path.display(), "starting");

    // The lock spans load, resolve and store.
    let lock = match HistoryLock::acquire(&config.lock_path(), config.lock_timeout) {
        Ok(lock) => {
            debug!(lock = %lock.path().display(), "history lock held");
            Some(lock)
        }
        Err(e) => {
            warn!(error = %e, "history lock unavailable, changes will not be saved");
            None
        }
    };
    let (mut history, writable) = load_history(&config.history_path);

    let options = ResolveOptions::from_header(history.header(), config.search_depth);
    let emitter = ShellEmitter::new(config.shell, history.header());
    let mut fs = StdFileSystem::new();
    let resolution = JumpResolver::new(&mut fs, &mut history, options)
        .resolve(&destination)
        .map_err(JumpError::from)?;
    debug!(directory = %resolution.directory(), "resolved");

    if lock.is_some() && writable && history.is_dirty() {
        if let Err(e) = history.store(&config.history_path) {
            warn!(error = %e, "history not saved");
        }
    }
    drop(lock);

    Ok(emitter.emit(&resolution))
}

/// Load the history, degrading to an empty one. The flag says whether the
/// file may be overwritten afterwards.
fn load_history(path: &Path) -> (HistoryStore, bool) {
    match HistoryStore::load(path) {
        Ok(store) => (store, true),
        Err(e @ HistoryError::Corrupt { .. }) => {
            warn!(error = %e, "ignoring corrupt history");
            (HistoryStore::new(), true)
        }
        Err(e) => {
            warn!(error = %e, "history unusable, leaving the file untouched");
            (HistoryStore::new(), false)
        }
    }
}

fn report(err: &anyhow::Error) -> ExitCode {
    let jump = err.downcast_ref::<JumpError>();
    match jump {
        Some(JumpError::Resolve(
            ResolveError::NotFound { .. } | ResolveError::Ambiguous { .. },
        )) => debug!(error = %err, "no directory change"),
        _ => eprintln!("jumpdir: {err:#}"),
    }
    ExitCode::from(jump.map_or(1, JumpError::exit_code))
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

//! Command-line surface.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "jumpdir")]
#[command(about = "Adaptive directory navigation for the command line")]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Print diagnostic tracing to stderr
    #[arg(short = 'd', long = "debug", short_alias = 'D')]
    pub debug: bool,

    /// Directory, wildcard pattern (`?`, `*`, `**`), or `...`-prefixed suffix
    pub destination: Vec<String>,
}

impl Cli {
    /// Positional arguments joined into one destination, `\` read as `/`.
    pub fn destination(&self) -> String {
        self.destination.join(" ").replace('\\', "/")
    }
}

/// Help spellings accepted from both Unix and Windows habits.
pub fn is_help(arg: &str) -> bool {
    matches!(
        arg.to_ascii_lowercase().as_str(),
        "-h" | "-?" | "/h" | "/?" | "--help"
    )
}

pub const USAGE: &[&str] = &[
    "",
    concat!("jumpdir v", env!("CARGO_PKG_VERSION")),
    "",
    "jumpdir: Adaptive directory navigation for the command line",
    "Usage:   jumpdir [-d] <directory>",
    "",
    "    Changes to the directory given. Wildcards ? and * match within one",
    "    path segment, ** matches any number of segments, and a leading ...",
    "    finds any remembered directory ending with the rest of the pattern.",
    "",
    "    -d, -D    print diagnostics to the error stream",
];

//! Shell command text written to stdout for the wrapper to evaluate.

use jumpdir_core::path;
use jumpdir_core::{HistoryHeader, ShellFlavor};
use jumpdir_resolve::Resolution;

/// Renders resolution outcomes as shell commands.
#[derive(Debug, Clone, Copy)]
pub struct ShellEmitter {
    flavor: ShellFlavor,
    dir_echo: bool,
    verbose: bool,
}

impl ShellEmitter {
    pub fn new(flavor: ShellFlavor, header: &HistoryHeader) -> Self {
        Self {
            flavor,
            dir_echo: header.dir_echo,
            verbose: header.verbose,
        }
    }

    /// Plain emitter without the history's echo flags.
    pub fn plain(flavor: ShellFlavor) -> Self {
        Self::new(
            flavor,
            &HistoryHeader {
                dir_echo: false,
                verbose: false,
                ..HistoryHeader::default()
            },
        )
    }

    pub fn emit(&self, resolution: &Resolution) -> Vec<String> {
        match resolution {
            Resolution::Unchanged { cwd } => vec![self.echo(&self.native(cwd))],
            Resolution::Changed { target } => {
                let cd = self.cd(target);
                let mut lines = Vec::with_capacity(3);
                if self.verbose {
                    lines.push(self.echo(&cd));
                }
                lines.push(cd);
                if self.dir_echo {
                    lines.push(self.echo(&self.native(target)));
                }
                lines
            }
        }
    }

    /// One echo command per line of `text`.
    pub fn echo_lines<'a>(&self, text: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        text.into_iter().map(|line| self.echo(line)).collect()
    }

    fn cd(&self, target: &str) -> String {
        match self.flavor {
            ShellFlavor::Posix => format!("cd -- {}", single_quote(target)),
            ShellFlavor::Cmd => format!("cd /d \"{}\"", self.native(target)),
        }
    }

    fn echo(&self, text: &str) -> String {
        match self.flavor {
            ShellFlavor::Posix => format!("echo {}", single_quote(text)),
            ShellFlavor::Cmd if text.is_empty() => "echo.".to_string(),
            ShellFlavor::Cmd => format!("echo {}", caret_escape(text)),
        }
    }

    fn native(&self, p: &str) -> String {
        path::to_native(p, self.flavor == ShellFlavor::Cmd)
    }
}

/// cmd.exe escaping for unquoted text: `^`, `&`, `|`, `<` and `>` get a
/// caret. Text between double quotes is already literal to cmd and is left
/// alone.
fn caret_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '"' => quoted = !quoted,
            '^' | '&' | '|' | '<' | '>' if !quoted => out.push('^'),
            _ => {}
        }
        out.push(c);
    }
    out
}

/// POSIX single-quoting: `'` becomes `'\''`.
fn single_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

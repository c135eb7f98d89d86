//! Console messages for the command-line front end.
//!
//! Results and status lines go to stdout and disappear in quiet mode.
//! Warnings go to stderr and are always shown. Diagnostics belong to
//! `tracing`, not here.
//!
//! # Examples
//!
//! ```
//! use pdfworks::output::formatter::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Loaded 2 file(s)");
//! formatter.success("Created merged.pdf (1.20 MB)");
//! ```

use std::io::{self, IsTerminal};

use crate::config::OutputConfig;

const RESET: &str = "\x1b[0m";

/// Kind of console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Plain status line.
    Info,
    /// A finished output.
    Success,
    /// Something the user should look at; printed even when quiet.
    Warning,
}

impl MessageLevel {
    fn marker(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "✓ ",
            Self::Warning => "⚠ ",
        }
    }

    fn ansi(self) -> Option<&'static str> {
        match self {
            Self::Info => None,
            Self::Success => Some("\x1b[32m"),
            Self::Warning => Some("\x1b[33m"),
        }
    }
}

/// Prints user-facing messages according to the output settings.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    colored: bool,
}

impl OutputFormatter {
    /// Formatter printing in color when stdout is a terminal.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let colored = io::stdout().is_terminal() && std::env::var_os("TERM").is_some();
        Self {
            quiet,
            verbose,
            colored,
        }
    }

    /// Formatter for the given settings. JSON output silences status lines.
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.quiet || config.json, config.verbose)
    }

    /// Formatter that only prints warnings.
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Status line.
    pub fn info(&self, message: &str) {
        self.emit(MessageLevel::Info, message);
    }

    /// Line announcing a finished output.
    pub fn success(&self, message: &str) {
        self.emit(MessageLevel::Success, message);
    }

    /// Warning on stderr.
    pub fn warning(&self, message: &str) {
        self.emit(MessageLevel::Warning, message);
    }

    /// `label: value` line, verbose mode only.
    pub fn detail(&self, label: &str, value: &str) {
        if self.verbose && !self.quiet {
            println!("  {label}: {value}");
        }
    }

    /// Numbered entry of a listing.
    pub fn list_item(&self, index: usize, message: &str) {
        if !self.quiet {
            println!("  {index}. {message}");
        }
    }

    /// Whether a progress bar may be drawn.
    pub fn should_print(&self) -> bool {
        !self.quiet
    }

    /// Whether status lines are suppressed.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn emit(&self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Warning => eprintln!("{}", self.render(level, message)),
            _ if self.quiet => {}
            _ => println!("{}", self.render(level, message)),
        }
    }

    fn render(&self, level: MessageLevel, message: &str) -> String {
        match level.ansi() {
            Some(color) if self.colored => format!("{color}{}{message}{RESET}", level.marker()),
            _ => format!("{}{message}", level.marker()),
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

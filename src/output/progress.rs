//! Terminal progress bar driven by engine percentages.
//!
//! # Examples
//!
//! ```
//! use pdfworks::output::ConsoleProgress;
//! use pdfworks::progress::ProgressReporter;
//!
//! let progress = ConsoleProgress::disabled();
//! progress.report(40);
//! assert_eq!(progress.percent(), 40);
//! ```

use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use crate::progress::ProgressReporter;

const BAR_WIDTH: usize = 40;

/// Percentage bar on stdout.
///
/// Redraws are rate limited except for the final 100%.
pub struct ConsoleProgress {
    message: Mutex<Option<String>>,
    percent: AtomicU8,
    start_time: Instant,
    last_update: Mutex<Option<Instant>>,
    update_interval: Duration,
    enabled: bool,
}

impl ConsoleProgress {
    /// Bar that draws when stdout is a terminal.
    pub fn new() -> Self {
        use std::io::IsTerminal;
        Self::with_enabled(io::stdout().is_terminal())
    }

    /// Bar that never draws.
    pub fn disabled() -> Self {
        Self::with_enabled(false)
    }

    fn with_enabled(enabled: bool) -> Self {
        Self {
            message: Mutex::new(None),
            percent: AtomicU8::new(0),
            start_time: Instant::now(),
            last_update: Mutex::new(None),
            update_interval: Duration::from_millis(100),
            enabled,
        }
    }

    /// Label shown before the bar.
    pub fn set_message(&self, message: impl Into<String>) {
        if let Ok(mut current) = self.message.lock() {
            *current = Some(message.into());
        }
    }

    /// Last reported percentage.
    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    /// Time since the bar was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Erase the bar from the terminal.
    pub fn clear(&self) {
        if self.enabled {
            print!("\r\x1b[K");
            io::stdout().flush().ok();
        }
    }

    fn render_bar(&self) -> String {
        let percent = usize::from(self.percent());
        let filled = BAR_WIDTH * percent / 100;
        let bar = format!(
            "[{}{}{}]",
            "=".repeat(filled.saturating_sub(1)),
            if filled > 0 { ">" } else { "" },
            " ".repeat(BAR_WIDTH - filled)
        );

        let mut parts = vec![bar, format!("{percent:>3}%"), format_duration(self.elapsed())];
        if let Some(message) = self.message.lock().ok().and_then(|message| message.clone()) {
            parts.insert(0, message);
        }
        parts.join(" ")
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, percent: u8) {
        self.percent.store(percent.min(100), Ordering::Relaxed);
        if !self.enabled {
            return;
        }

        let done = percent >= 100;
        let Ok(mut last_update) = self.last_update.lock() else {
            return;
        };
        let due = (*last_update).is_none_or(|last| last.elapsed() >= self.update_interval);
        if !done && !due {
            return;
        }

        *last_update = Some(Instant::now());
        print!("\r{}", self.render_bar());
        if done {
            println!();
        }
        io::stdout().flush().ok();
    }
}

/// Format a duration as a human-readable string.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

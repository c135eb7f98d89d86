//! Progress reporting for long-running transforms.
//!
//! The engine talks to a [`ProgressReporter`] sink through a [`Progress`]
//! tracker, which clamps values to `0..=100` and never lets them go
//! backwards. Closures taking a `u8` implement the trait directly.
//!
//! Reporters are `Sync`, so a running transform can move between threads.
//!
//! # Examples
//!
//! ```
//! use pdfworks::progress::{Progress, ProgressReporter};
//! use std::sync::Mutex;
//!
//! let seen = Mutex::new(Vec::new());
//! let sink = |percent: u8| seen.lock().unwrap().push(percent);
//!
//! let progress = Progress::new(&sink);
//! progress.report(30);
//! progress.report(20); // ignored, would go backwards
//! progress.finish();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![30, 100]);
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

/// Marks a tracker that has not reported anything yet.
const UNSET: u8 = u8::MAX;

/// Sink for percentage updates in `0..=100`.
pub trait ProgressReporter: Sync {
    /// Receive a new percentage.
    fn report(&self, percent: u8);
}

impl<F> ProgressReporter for F
where
    F: Fn(u8) + Sync,
{
    fn report(&self, percent: u8) {
        self(percent)
    }
}

/// Reporter that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _percent: u8) {}
}

/// Monotonic view over a [`ProgressReporter`].
pub struct Progress<'a> {
    sink: &'a dyn ProgressReporter,
    last: AtomicU8,
}

impl<'a> Progress<'a> {
    /// Wrap a reporter.
    pub fn new(sink: &'a dyn ProgressReporter) -> Self {
        Self {
            sink,
            last: AtomicU8::new(UNSET),
        }
    }

    /// Report a percentage; values below the last reported one are dropped.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let advanced = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                (last == UNSET || percent > last).then_some(percent)
            })
            .is_ok();
        if advanced {
            self.sink.report(percent);
        }
    }

    /// Report `base + round(done / total * span)`.
    ///
    /// Used for per-page updates: `done` of `total` items map onto the band
    /// `base..=base + span`.
    pub fn report_fraction(&self, base: u8, span: u8, done: usize, total: usize) {
        let fraction = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };
        let value = f64::from(base) + (fraction * f64::from(span)).round();
        self.report(value.min(100.0) as u8);
    }

    /// Report completion.
    pub fn finish(&self) {
        self.report(100);
    }

    /// Last value reported, if any.
    pub fn last(&self) -> Option<u8> {
        let last = self.last.load(Ordering::Acquire);
        (last != UNSET).then_some(last)
    }
}

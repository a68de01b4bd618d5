//! Progress and timing output for a dispatch run.
//!
//! Best effort only: write errors on the console sink are ignored and an
//! estimate is printed only once at least one worker has exited.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::outcome::WorkerOutcome;

/// Estimates the time left as `elapsed / exited * remaining`.
///
/// Returns `None` until at least one worker has exited.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cdft_dispatch::estimate_remaining;
///
/// let eta = estimate_remaining(Duration::from_secs(30), 3, 6);
/// assert_eq!(eta, Some(Duration::from_secs(60)));
/// assert_eq!(estimate_remaining(Duration::from_secs(30), 0, 6), None);
/// ```
#[must_use]
pub fn estimate_remaining(elapsed: Duration, exited: usize, remaining: usize) -> Option<Duration> {
    let exited = u32::try_from(exited).ok().filter(|&n| n > 0)?;
    let remaining = u32::try_from(remaining).ok()?;
    elapsed.checked_div(exited)?.checked_mul(remaining)
}

/// Formats a duration as `HHh:MMm:SSs:mmmms`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cdft_dispatch::format_elapsed;
///
/// assert_eq!(format_elapsed(Duration::from_millis(62_003)), "00h:01m:02s:003ms");
/// ```
#[must_use]
pub fn format_elapsed(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{hours:02}h:{minutes:02}m:{seconds:02}s:{millis:03}ms")
}

/// Console progress for one dispatch run.
#[derive(Debug)]
pub struct ProgressTracker<W = io::Stdout> {
    out: W,
    started: Instant,
    exited: usize,
}

impl ProgressTracker<io::Stdout> {
    /// Creates a tracker that writes to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ProgressTracker<W> {
    /// Creates a tracker that writes console lines to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: Instant::now(),
            exited: 0,
        }
    }

    /// Records that a worker was started.
    pub fn on_spawned(&mut self, pid: Option<u32>, label: &str) {
        let pid = pid.map_or_else(|| "?".to_owned(), |pid| pid.to_string());
        let _ = writeln!(self.out, "Starting process # {pid} for : {label}");
    }

    /// Records that all spawn attempts are done and `count` workers are running.
    pub fn on_started(&mut self, count: usize) {
        self.started = Instant::now();
        self.exited = 0;
        info!(workers = count, "Workers started");
        let _ = writeln!(self.out, "{count} processes left");
    }

    /// Records a reaped worker with `remaining` still running.
    pub fn on_exit(&mut self, outcome: &WorkerOutcome, remaining: usize) {
        self.exited += 1;

        if outcome.exit.is_crash() {
            warn!(
                label = %outcome.label,
                exit = %outcome.exit,
                "Worker crashed; none of its failures were reported"
            );
        } else {
            info!(
                label = %outcome.label,
                exit = %outcome.exit,
                elapsed = %format_elapsed(outcome.elapsed),
                remaining,
                "Worker exited"
            );
        }

        let _ = writeln!(self.out, "{} has exited.", outcome.label);
        let _ = writeln!(self.out, "{remaining} processes left");
        let eta = estimate_remaining(self.started.elapsed(), self.exited, remaining)
            .filter(|_| remaining > 0);
        if let Some(eta) = eta {
            let _ = writeln!(self.out, "Estimated time remaining: {}", format_elapsed(eta));
        }
    }

    /// Records the end of the run.
    pub fn finish(&mut self, total: Duration) {
        let total = format_elapsed(total);
        info!(total = %total, exited = self.exited, "Dispatch finished");
        let _ = writeln!(self.out, "Total execution time: {total}");
        let _ = self.out.flush();
    }

    /// Consumes the tracker and returns its sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::WorkerExit;

    fn outcome(label: &str, exit: WorkerExit) -> WorkerOutcome {
        WorkerOutcome {
            pid: Some(7),
            label: label.to_owned(),
            elapsed: Duration::from_millis(1_500),
            exit,
        }
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "00h:00m:00s:000ms");
        assert_eq!(
            format_elapsed(Duration::from_millis(3_723_004)),
            "01h:02m:03s:004ms"
        );
        assert_eq!(
            format_elapsed(Duration::from_secs(100 * 3_600)),
            "100h:00m:00s:000ms"
        );
    }

    #[test]
    fn test_estimate_remaining() {
        assert_eq!(
            estimate_remaining(Duration::from_secs(10), 2, 4),
            Some(Duration::from_secs(20))
        );
        assert_eq!(
            estimate_remaining(Duration::from_secs(10), 5, 0),
            Some(Duration::ZERO)
        );
        assert_eq!(estimate_remaining(Duration::from_secs(10), 0, 4), None);
    }

    #[test]
    fn test_console_lines() {
        let mut tracker = ProgressTracker::new(Vec::new());
        tracker.on_spawned(Some(1234), "TOFxEH2013");
        tracker.on_started(2);
        tracker.on_exit(&outcome("TOFxEH2013", WorkerExit::Success), 1);
        tracker.on_exit(&outcome("HOPE2014", WorkerExit::Crashed { signal: 11 }), 0);
        tracker.finish(Duration::from_millis(62_003));

        let text = String::from_utf8(tracker.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Starting process # 1234 for : TOFxEH2013");
        assert_eq!(lines[1], "2 processes left");
        assert_eq!(lines[2], "TOFxEH2013 has exited.");
        assert_eq!(lines[3], "1 processes left");
        assert!(lines[4].starts_with("Estimated time remaining: "));
        assert_eq!(lines[5], "HOPE2014 has exited.");
        assert_eq!(lines[6], "0 processes left");
        assert_eq!(lines[7], "Total execution time: 00h:01m:02s:003ms");
    }
}

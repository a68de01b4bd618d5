//! Worker handles, exit classification, and the dispatch summary.

use std::fmt;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;

use crate::error::DispatchError;

/// How a worker process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerExit {
    /// Exited with status 0.
    Success,

    /// Exited with a non-zero status.
    Failed {
        /// The exit code.
        code: i32,
    },

    /// Killed by a signal, typically a fault inside the probe library.
    Crashed {
        /// The terminating signal number.
        signal: i32,
    },

    /// The exit status could not be determined.
    Unknown,
}

impl WorkerExit {
    /// Classifies a reaped exit status.
    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return Self::Success;
        }
        if let Some(code) = status.code() {
            return Self::Failed { code };
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Crashed { signal };
            }
        }
        Self::Unknown
    }

    /// Returns `true` for [`WorkerExit::Success`].
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns `true` for [`WorkerExit::Crashed`].
    #[inline]
    #[must_use]
    pub const fn is_crash(self) -> bool {
        matches!(self, Self::Crashed { .. })
    }
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed { code } => write!(f, "exit code {code}"),
            Self::Crashed { signal } => write!(f, "killed by signal {signal}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// A running worker tracked by the dispatcher.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    pub(crate) pid: Option<u32>,
    pub(crate) label: String,
    started: Instant,
    completed: Option<Duration>,
}

impl WorkerHandle {
    pub(crate) fn new(pid: Option<u32>, label: impl Into<String>) -> Self {
        Self {
            pid,
            label: label.into(),
            started: Instant::now(),
            completed: None,
        }
    }

    /// Marks the worker complete and returns its wall time.
    ///
    /// Only the first call stops the stopwatch.
    pub(crate) fn complete(&mut self) -> Duration {
        *self.completed.get_or_insert_with(|| self.started.elapsed())
    }

    pub(crate) fn into_outcome(mut self, exit: WorkerExit) -> WorkerOutcome {
        let elapsed = self.complete();
        WorkerOutcome {
            pid: self.pid,
            label: self.label,
            elapsed,
            exit,
        }
    }
}

/// A reaped worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOutcome {
    /// Process id, if the OS reported one.
    pub pid: Option<u32>,
    /// Group label of the worker's directory.
    pub label: String,
    /// Wall time from spawn to exit notification.
    pub elapsed: Duration,
    /// How the worker ended.
    pub exit: WorkerExit,
}

/// A directory whose worker never started.
#[derive(Debug)]
pub struct SpawnFailure {
    /// The directory that was skipped.
    pub path: Utf8PathBuf,
    /// Why the worker did not start.
    pub error: DispatchError,
}

/// The result of one dispatch run.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    /// Number of workers started.
    pub started: usize,
    /// Workers that could not be started.
    pub spawn_failures: Vec<SpawnFailure>,
    /// Every reaped worker, in exit order.
    pub outcomes: Vec<WorkerOutcome>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl DispatchSummary {
    /// Number of workers that exited successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.exit.is_success()).count()
    }

    /// Number of workers killed by a signal.
    #[must_use]
    pub fn crashed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.exit.is_crash()).count()
    }

    /// Console notice naming the crashed workers, if there were any.
    ///
    /// A crashed worker never flushes, so every failure it had collected for
    /// its directory is lost, not only the one for the file in flight.
    #[must_use]
    pub fn crash_notice(&self) -> Option<String> {
        let labels: Vec<&str> = self
            .outcomes
            .iter()
            .filter(|o| o.exit.is_crash())
            .map(|o| o.label.as_str())
            .collect();
        if labels.is_empty() {
            return None;
        }
        Some(format!(
            "{} worker(s) crashed before writing their reports; rerun to check: {}",
            labels.len(),
            labels.join(", ")
        ))
    }

    /// Returns `true` if every started worker exited successfully and none failed to start.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.spawn_failures.is_empty() && self.succeeded() == self.outcomes.len()
    }
}

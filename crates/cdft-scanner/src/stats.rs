//! Probe statistics with atomic counters.
//!
//! [`ProbeStats`] is shared by every probing thread inside a worker;
//! [`ProbeStatsSnapshot`] is the point-in-time copy logged when the worker
//! finishes.
//!
//! Counters use [`Relaxed`](std::sync::atomic::Ordering::Relaxed) ordering.
//! They are informational and never drive control flow.
//!
//! # Examples
//!
//! ```
//! use cdft_scanner::ProbeStats;
//!
//! let stats = ProbeStats::new();
//! stats.record_ok();
//! stats.record_probe_failure();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.probed, 2);
//! assert_eq!(snapshot.failed(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for probe outcomes.
#[derive(Debug, Default)]
pub struct ProbeStats {
    /// Files probed.
    probed: AtomicU64,
    /// Files that passed.
    ok: AtomicU64,
    /// Files whose open or close failed.
    probe_failures: AtomicU64,
    /// Files whose modification time changed.
    anomalies: AtomicU64,
}

impl ProbeStats {
    /// Creates a new [`ProbeStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a file that passed the probe.
    #[inline]
    pub fn record_ok(&self) {
        self.probed.fetch_add(1, Ordering::Relaxed);
        self.ok.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a file whose open or close failed.
    #[inline]
    pub fn record_probe_failure(&self) {
        self.probed.fetch_add(1, Ordering::Relaxed);
        self.probe_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a file whose modification time changed.
    #[inline]
    pub fn record_anomaly(&self) {
        self.probed.fetch_add(1, Ordering::Relaxed);
        self.anomalies.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> ProbeStatsSnapshot {
        ProbeStatsSnapshot {
            probed: self.probed.load(Ordering::Relaxed),
            ok: self.ok.load(Ordering::Relaxed),
            probe_failures: self.probe_failures.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of probe statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProbeStatsSnapshot {
    /// Files probed.
    pub probed: u64,
    /// Files that passed.
    pub ok: u64,
    /// Files whose open or close failed.
    pub probe_failures: u64,
    /// Files whose modification time changed.
    pub anomalies: u64,
}

impl ProbeStatsSnapshot {
    /// Returns the number of files that produced a failure record.
    #[inline]
    #[must_use]
    pub const fn failed(&self) -> u64 {
        self.probe_failures + self.anomalies
    }
}

//! Probe results and failure records.
//!
//! A [`ProbeRecord`] is produced for every probed file. Only records carrying
//! a [`FailureKind`] survive as [`FailureRecord`]s; OK records are dropped
//! as soon as they are classified.

use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Description written for a modification anomaly.
const ANOMALY_DESCRIPTION: &str = "last modified time changed after open and close";

/// Description used when the library reports an error with no message.
const UNKNOWN_FAILURE: &str = "probe failed without an error message";

/// Why a probed file was reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FailureKind {
    /// Open or close returned an error.
    ProbeFailure {
        /// The error message reported by the library.
        message: String,
    },

    /// Open and close both succeeded but the file's modification time moved.
    ModificationAnomaly,
}

impl FailureKind {
    /// Creates a probe failure, substituting a fixed text for an empty message.
    #[must_use]
    pub fn probe_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNKNOWN_FAILURE.to_owned()
        } else {
            message
        };
        Self::ProbeFailure { message }
    }

    /// Returns the description persisted in the report header line.
    ///
    /// Never empty.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::ProbeFailure { message } => message,
            Self::ModificationAnomaly => ANOMALY_DESCRIPTION,
        }
    }

    /// Returns `true` for [`FailureKind::ModificationAnomaly`].
    #[inline]
    #[must_use]
    pub const fn is_anomaly(&self) -> bool {
        matches!(self, Self::ModificationAnomaly)
    }
}

/// The result of probing one file.
///
/// # Examples
///
/// ```
/// use std::time::SystemTime;
/// use cdft_core::{FailureKind, ProbeRecord};
///
/// let now = SystemTime::now();
/// let ok = ProbeRecord::ok("/data/a.cdf".into(), now, now);
/// assert!(ok.into_failure().is_none());
///
/// let failed = ProbeRecord::failed(
///     "/data/b.cdf".into(),
///     FailureKind::probe_failure("bad magic number"),
///     now,
///     now,
/// );
/// assert_eq!(failed.into_failure().unwrap().description(), "bad magic number");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRecord {
    /// Absolute path of the probed file.
    pub path: Utf8PathBuf,
    /// Failure classification, `None` when the file is OK.
    pub failure: Option<FailureKind>,
    /// Modification time read immediately before the probe.
    pub modified_before: SystemTime,
    /// Modification time read immediately after the probe.
    pub modified_after: SystemTime,
}

impl ProbeRecord {
    /// Creates a record for a file that passed the probe.
    #[must_use]
    pub const fn ok(path: Utf8PathBuf, before: SystemTime, after: SystemTime) -> Self {
        Self {
            path,
            failure: None,
            modified_before: before,
            modified_after: after,
        }
    }

    /// Creates a record for a file that failed the probe.
    #[must_use]
    pub const fn failed(
        path: Utf8PathBuf,
        kind: FailureKind,
        before: SystemTime,
        after: SystemTime,
    ) -> Self {
        Self {
            path,
            failure: Some(kind),
            modified_before: before,
            modified_after: after,
        }
    }

    /// Returns `true` if the file passed the probe.
    #[inline]
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.failure.is_none()
    }

    /// Converts into a [`FailureRecord`], discarding OK records.
    #[must_use]
    pub fn into_failure(self) -> Option<FailureRecord> {
        let kind = self.failure?;
        Some(FailureRecord {
            path: self.path,
            kind,
            modified_before: self.modified_before,
            modified_after: self.modified_after,
        })
    }
}

/// A persisted record of a probe failure or modification anomaly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Absolute path of the probed file.
    pub path: Utf8PathBuf,
    /// Why the file was reported.
    pub kind: FailureKind,
    /// Modification time read immediately before the probe.
    pub modified_before: SystemTime,
    /// Modification time read immediately after the probe (or at failure).
    pub modified_after: SystemTime,
}

impl FailureRecord {
    /// Returns the non-empty failure description.
    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        self.kind.description()
    }

    /// Returns the path of the reported file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

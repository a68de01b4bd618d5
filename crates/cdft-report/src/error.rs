//! Error types for the cdft-report crate.

use camino::Utf8PathBuf;

/// Errors that can occur while writing a report.
///
/// A failed flush drops its records. Callers log the error and carry on;
/// nothing is retried.
///
/// # Examples
///
/// ```
/// use cdft_report::ReportError;
/// use std::io;
///
/// let err = ReportError::open("/reports/TOFxEH2013_1.txt", io::Error::other("denied"));
/// assert!(err.to_string().contains("TOFxEH2013_1.txt"));
/// assert_eq!(err.path().map(|p| p.as_str()), Some("/reports/TOFxEH2013_1.txt"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Neither a desktop nor a home directory could be determined.
    #[error("no desktop or home directory available for reports")]
    NoReportDir,

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// The report directory could not be created.
    #[error("unable to create report directory {path}: {source}")]
    CreateDir {
        /// The directory that couldn't be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The host-wide lock could not be opened or acquired.
    #[error("unable to acquire report lock {path}: {source}")]
    Lock {
        /// The lock file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The report file could not be opened.
    #[error("unable to access file: {path}: {source}")]
    Open {
        /// The report file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing or truncating the report file failed.
    #[error("failed to write report {path}: {source}")]
    Write {
        /// The report file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Creates a new [`ReportError::CreateDir`] error.
    #[inline]
    pub fn create_dir(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ReportError::Lock`] error.
    #[inline]
    pub fn lock(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Lock {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ReportError::Open`] error.
    #[inline]
    pub fn open(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ReportError::Write`] error.
    #[inline]
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Returns the path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::CreateDir { path, .. }
            | Self::Lock { path, .. }
            | Self::Open { path, .. }
            | Self::Write { path, .. } => Some(path),
            Self::NoReportDir | Self::NonUtf8Path(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_lock_error_display() {
        let err = ReportError::lock(
            "/tmp/INVALID_CDF_LOG_FILE_MUTEX.lock",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("INVALID_CDF_LOG_FILE_MUTEX"));
    }

    #[test]
    fn test_no_report_dir_has_no_path() {
        assert!(ReportError::NoReportDir.path().is_none());
    }
}

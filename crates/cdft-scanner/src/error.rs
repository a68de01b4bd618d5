//! Error types for the cdft-scanner crate.
//!
//! - [`ScanError`] covers directory listing and traversal failures.
//! - [`ProbeError`] is what a [`ProbeLibrary`](crate::ProbeLibrary) returns
//!   from `open` or `close`.

use camino::Utf8PathBuf;

/// Errors that can occur while discovering or listing target directories.
///
/// # Error Recovery Strategy
///
/// None of these stop a run. Discovery logs and skips unreadable entries; a
/// worker that cannot list its directory logs the error and flushes whatever
/// it already collected.
///
/// # Examples
///
/// ```
/// use cdft_scanner::ScanError;
/// use std::io;
///
/// let err = ScanError::read_dir("/data/TOFxEH/2013", io::Error::other("denied"));
/// assert_eq!(err.path().map(|p| p.as_str()), Some("/data/TOFxEH/2013"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to walk part of a directory tree.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to list the entries of a target directory.
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        /// The directory that couldn't be listed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl ScanError {
    /// Creates a new [`ScanError::ReadDir`] error.
    #[inline]
    pub fn read_dir(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::ReadDir {
            path: path.into(),
            source,
        }
    }

    /// Returns the directory associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::ReadDir { path, .. } => Some(path),
            Self::Walk(_) | Self::NonUtf8Path(_) => None,
        }
    }
}

/// An error reported by the probing library for one file.
///
/// The message becomes the failure description in the report, so it must
/// describe what went wrong without further context.
///
/// # Examples
///
/// ```
/// use cdft_scanner::ProbeError;
///
/// let err = ProbeError::new("CDF_OPEN_ERROR");
/// assert_eq!(err.to_string(), "CDF_OPEN_ERROR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProbeError {
    message: String,
}

impl ProbeError {
    /// Creates a probe error with the given message.
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_scan_error_read_dir() {
        let err = ScanError::read_dir(
            "/data/HOPE/2014",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.path().map(|p| p.as_str()), Some("/data/HOPE/2014"));
        assert!(err.to_string().contains("/data/HOPE/2014"));
    }

    #[test]
    fn test_scan_error_non_utf8() {
        use std::path::PathBuf;
        let err = ScanError::NonUtf8Path(PathBuf::from("test"));
        assert!(err.path().is_none());
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn test_probe_error_from_io() {
        let err = ProbeError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.message(), "gone");
    }
}

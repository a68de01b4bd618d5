//! Error types for the cdft-dispatch crate.

use camino::Utf8PathBuf;

/// Errors that can occur while dispatching workers.
///
/// # Error Recovery Strategy
///
/// - **Missing executable** ([`DispatchError::MissingExecutable`]): Fatal - nothing can be started
/// - **Current executable** ([`DispatchError::CurrentExe`]): Fatal - no default worker binary
/// - **Non-UTF-8 path** ([`DispatchError::NonUtf8Path`]): Fatal - worker binary path unusable
/// - **Spawn** ([`DispatchError::Spawn`]): Recoverable - that directory is skipped
///
/// # Examples
///
/// ```
/// use cdft_dispatch::DispatchError;
///
/// let err = DispatchError::missing_executable("/opt/cdftester/cdftester");
/// assert!(err.is_fatal());
/// assert!(err.to_string().contains("/opt/cdftester/cdftester"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The worker executable does not exist.
    #[error("worker executable not found: {0}")]
    MissingExecutable(Utf8PathBuf),

    /// The path of the running executable could not be determined.
    #[error("unable to locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// A worker process could not be started.
    #[error("failed to start worker for {label}: {source}")]
    Spawn {
        /// Group label of the directory the worker was for.
        label: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// Creates a new [`DispatchError::MissingExecutable`] error.
    #[inline]
    pub fn missing_executable(path: impl Into<Utf8PathBuf>) -> Self {
        Self::MissingExecutable(path.into())
    }

    /// Creates a new [`DispatchError::Spawn`] error.
    #[inline]
    pub fn spawn(label: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            label: label.into(),
            source,
        }
    }

    /// Returns `true` if the run can continue past this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }

    /// Returns `true` if this error aborts the run.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}

//! Worker command line.
//!
//! A worker is started as
//!
//! ```text
//! <program> [prefix args...] --worker [--coll] <directory>
//! ```
//!
//! The prefix carries options the dispatcher was itself started with
//! (configuration file, report directory, log verbosity) so the worker sees
//! the same settings.

use std::process::Stdio;

use camino::{Utf8Path, Utf8PathBuf};
use cdft_core::{OutputMode, TargetDirectory};
use tokio::process::Command;

use crate::error::DispatchError;

/// Flag that switches the binary into worker mode.
pub const WORKER_FLAG: &str = "--worker";

/// Flag that requests collection output from a worker.
pub const COLLECTION_FLAG: &str = "--coll";

/// Builds the command line for each worker.
///
/// # Examples
///
/// ```
/// use cdft_core::{OutputMode, TargetDirectory};
/// use cdft_dispatch::WorkerCommand;
///
/// let command = WorkerCommand::new("/usr/bin/cdftester", OutputMode::Collection)
///     .with_prefix_args(["--report-dir", "/srv/reports"]);
/// let dir = TargetDirectory::new("/data/TOFxEH/2013".into());
///
/// assert_eq!(
///     command.args_for(&dir),
///     ["--report-dir", "/srv/reports", "--worker", "--coll", "/data/TOFxEH/2013"]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: Utf8PathBuf,
    prefix: Vec<String>,
    mode: OutputMode,
}

impl WorkerCommand {
    /// Creates a command that runs `program` for each directory.
    #[must_use]
    pub fn new(program: impl Into<Utf8PathBuf>, mode: OutputMode) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
            mode,
        }
    }

    /// Creates a command that re-executes the running binary.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::CurrentExe`] if the running binary cannot be
    /// located, or [`DispatchError::NonUtf8Path`] if its path is not UTF-8.
    pub fn current_exe(mode: OutputMode) -> Result<Self, DispatchError> {
        let exe = std::env::current_exe().map_err(DispatchError::CurrentExe)?;
        let exe = Utf8PathBuf::from_path_buf(exe).map_err(DispatchError::NonUtf8Path)?;
        Ok(Self::new(exe, mode))
    }

    /// Adds arguments placed before the worker flag.
    #[must_use]
    pub fn with_prefix_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the worker executable.
    #[inline]
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Returns the output mode passed to every worker.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Returns the arguments for the worker probing `dir`.
    #[must_use]
    pub fn args_for(&self, dir: &TargetDirectory) -> Vec<String> {
        let mut args = Vec::with_capacity(self.prefix.len() + 3);
        args.extend(self.prefix.iter().cloned());
        args.push(WORKER_FLAG.to_owned());
        if self.mode.is_collection() {
            args.push(COLLECTION_FLAG.to_owned());
        }
        args.push(dir.path().as_str().to_owned());
        args
    }

    /// Checks that the worker executable exists.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingExecutable`] if it does not.
    pub fn verify(&self) -> Result<(), DispatchError> {
        if self.program.is_file() {
            Ok(())
        } else {
            Err(DispatchError::missing_executable(&self.program))
        }
    }

    /// Builds the process for `dir`. Output is inherited from the dispatcher.
    pub(crate) fn build(&self, dir: &TargetDirectory) -> Command {
        let mut command = Command::new(self.program.as_std_path());
        command
            .args(self.args_for(dir))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir() -> TargetDirectory {
        TargetDirectory::new(Utf8PathBuf::from("/data/HOPE/2014"))
    }

    #[test]
    fn test_per_group_args() {
        let command = WorkerCommand::new("/usr/bin/cdftester", OutputMode::PerGroup);
        assert_eq!(command.args_for(&dir()), ["--worker", "/data/HOPE/2014"]);
    }

    #[test]
    fn test_collection_args() {
        let command = WorkerCommand::new("/usr/bin/cdftester", OutputMode::Collection);
        assert_eq!(
            command.args_for(&dir()),
            ["--worker", "--coll", "/data/HOPE/2014"]
        );
    }

    #[test]
    fn test_prefix_comes_first() {
        let command = WorkerCommand::new("/bin/sh", OutputMode::PerGroup)
            .with_prefix_args(["-c", "exit 0", "worker"]);
        let args = command.args_for(&dir());
        assert_eq!(&args[..3], ["-c", "exit 0", "worker"]);
        assert_eq!(args.last().map(String::as_str), Some("/data/HOPE/2014"));
    }

    #[test]
    fn test_verify_missing() {
        let command = WorkerCommand::new("/nonexistent/cdftester", OutputMode::PerGroup);
        assert!(matches!(
            command.verify(),
            Err(DispatchError::MissingExecutable(_))
        ));
    }

    #[test]
    fn test_verify_rejects_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        assert!(WorkerCommand::new(path, OutputMode::PerGroup).verify().is_err());
    }

    #[test]
    fn test_current_exe() {
        let command = WorkerCommand::current_exe(OutputMode::PerGroup).unwrap();
        assert!(command.verify().is_ok());
    }
}

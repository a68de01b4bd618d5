//! The probe unit.
//!
//! [`Prober`] opens and closes every target file of a directory through a
//! [`ProbeLibrary`] and classifies each one:
//!
//! - open or close returned an error: probe failure, described by the error
//! - both succeeded but the modification time moved: modification anomaly
//! - otherwise OK, and the result is dropped immediately
//!
//! A failing file never stops the batch. A library call that kills the
//! process does, and that is left to the dispatcher to observe.

use std::fs;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use cdft_core::{FailureKind, FailureRecord, ProbeRecord, ScanConfig, TargetDirectory};
use tracing::{debug, warn};

use crate::discover::is_target_file;
use crate::error::ScanError;
use crate::library::ProbeLibrary;
use crate::stats::ProbeStats;

/// Probes target files through a [`ProbeLibrary`].
///
/// # Examples
///
/// ```no_run
/// use cdft_core::{ScanConfig, TargetDirectory};
/// use cdft_scanner::{CdfHeaderLibrary, Prober};
///
/// let prober = Prober::new(CdfHeaderLibrary, &ScanConfig::default());
/// let dir = TargetDirectory::new("/data/TOFxEH/2013".into());
///
/// for failure in prober.probe_directory(&dir)? {
///     println!("{}: {}", failure.path, failure.description());
/// }
/// # Ok::<(), cdft_scanner::ScanError>(())
/// ```
#[derive(Debug)]
pub struct Prober<L> {
    library: L,
    extension: String,
    follow_links: bool,
    stats: ProbeStats,
}

impl<L: ProbeLibrary> Prober<L> {
    /// Creates a prober for the configured target extension.
    #[must_use]
    pub fn new(library: L, config: &ScanConfig) -> Self {
        Self {
            library,
            extension: config.target_extension.trim_start_matches('.').to_owned(),
            follow_links: config.follow_links,
            stats: ProbeStats::new(),
        }
    }

    /// Returns the probe counters.
    #[must_use]
    pub fn stats(&self) -> &ProbeStats {
        &self.stats
    }

    /// Probes a single file and classifies the result.
    pub fn probe_file(&self, path: &Utf8Path) -> ProbeRecord {
        let before = match modified_time(path) {
            Ok(time) => time,
            Err(e) => {
                self.stats.record_probe_failure();
                let kind =
                    FailureKind::probe_failure(format!("unable to read modification time: {e}"));
                return ProbeRecord::failed(
                    path.to_owned(),
                    kind,
                    SystemTime::UNIX_EPOCH,
                    SystemTime::UNIX_EPOCH,
                );
            }
        };

        let outcome = self
            .library
            .open(path)
            .and_then(|handle| self.library.close(handle));

        // Re-read at the point of completion or failure
        let after = modified_time(path).unwrap_or(before);

        match outcome {
            Err(e) => {
                self.stats.record_probe_failure();
                debug!(path = %path, error = %e, "Probe failed");
                ProbeRecord::failed(
                    path.to_owned(),
                    FailureKind::probe_failure(e.message()),
                    before,
                    after,
                )
            }
            Ok(()) if after != before => {
                self.stats.record_anomaly();
                warn!(path = %path, "Modification time changed during probe");
                ProbeRecord::failed(
                    path.to_owned(),
                    FailureKind::ModificationAnomaly,
                    before,
                    after,
                )
            }
            Ok(()) => {
                self.stats.record_ok();
                debug!(path = %path, "Probe ok");
                ProbeRecord::ok(path.to_owned(), before, after)
            }
        }
    }

    /// Probes every target file in `dir`, handing each failure to `on_failure`.
    ///
    /// Files are probed in name order. Returns the number of files probed.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ReadDir`] if the directory cannot be listed. No
    /// file has been probed in that case.
    pub fn probe_directory_with<F>(
        &self,
        dir: &TargetDirectory,
        mut on_failure: F,
    ) -> Result<usize, ScanError>
    where
        F: FnMut(FailureRecord),
    {
        let files = self.target_files(dir.path())?;
        debug!(dir = %dir.path(), files = files.len(), "Probing directory");

        for file in &files {
            if let Some(failure) = self.probe_file(file).into_failure() {
                on_failure(failure);
            }
        }

        Ok(files.len())
    }

    /// Probes every target file in `dir` and returns the failures.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ReadDir`] if the directory cannot be listed.
    pub fn probe_directory(&self, dir: &TargetDirectory) -> Result<Vec<FailureRecord>, ScanError> {
        let mut failures = Vec::new();
        self.probe_directory_with(dir, |failure| failures.push(failure))?;
        Ok(failures)
    }

    /// Lists the target files directly inside `dir`, sorted by name.
    fn target_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let entries = dir.read_dir_utf8().map_err(|e| ScanError::read_dir(dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir, error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            // Same rule as discovery: a followed link counts as its target
            let is_file = if self.follow_links {
                fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file())
            } else {
                entry.file_type().is_ok_and(|ft| ft.is_file())
            };
            if is_file && is_target_file(entry.path(), &self.extension) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Reads the last modification time of `path`.
fn modified_time(path: &Utf8Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

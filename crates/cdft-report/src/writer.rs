//! The report writer.
//!
//! [`ReportWriter::flush`] is the only way failure records reach disk. One
//! flush is one critical section under the host-wide lock: resolve the file
//! name, rotate a stale collection file, then append every block with a
//! single write. Blocks from different workers therefore never interleave.

use std::fs::{self, OpenOptions};
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use cdft_core::config::REPORT_FOLDER_NAME;
use cdft_core::{FailureRecord, OutputMode, ReportConfig};
use chrono::Local;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::format::render_records;
use crate::lock::HostLock;
use crate::naming::{collection_path, per_group_path, rotate_if_stale};

/// What a flush did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    /// The report file written, `None` if there was nothing to write.
    pub path: Option<Utf8PathBuf>,
    /// Number of blocks appended.
    pub written: usize,
    /// Whether a stale collection file was emptied first.
    pub rotated: bool,
}

impl FlushOutcome {
    /// Returns `true` if nothing was written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.written == 0
    }
}

/// Writes failure records to report files.
///
/// # Examples
///
/// ```no_run
/// use cdft_core::{OutputMode, ReportConfig};
/// use cdft_report::ReportWriter;
///
/// let writer = ReportWriter::from_config(&ReportConfig::default())?;
/// let outcome = writer.flush(&[], "TOFxEH2013", OutputMode::PerGroup)?;
/// assert!(outcome.is_empty());
/// # Ok::<(), cdft_report::ReportError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: Utf8PathBuf,
    lock: HostLock,
}

impl ReportWriter {
    /// Creates a writer for `dir` serialized by `lock`.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>, lock: HostLock) -> Self {
        Self {
            dir: dir.into(),
            lock,
        }
    }

    /// Creates a writer from configuration, resolving default locations.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::NoReportDir`] or [`ReportError::NonUtf8Path`] if
    /// a default location cannot be determined.
    pub fn from_config(config: &ReportConfig) -> Result<Self, ReportError> {
        let dir = match &config.report_dir {
            Some(dir) => dir.clone(),
            None => default_report_dir()?,
        };
        let lock = match &config.lock_dir {
            Some(lock_dir) => HostLock::new(lock_dir, &config.lock_name),
            None => HostLock::in_temp_dir(&config.lock_name)?,
        };
        Ok(Self::new(dir, lock))
    }

    /// Returns the report directory.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Appends `records` to the report for `label`.
    ///
    /// An empty slice writes nothing and creates no file.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] if the directory, lock, or report file cannot
    /// be used. The records are not written in that case.
    pub fn flush(
        &self,
        records: &[FailureRecord],
        label: &str,
        mode: OutputMode,
    ) -> Result<FlushOutcome, ReportError> {
        if records.is_empty() {
            debug!(label = %label, "No failures to report");
            return Ok(FlushOutcome::default());
        }

        fs::create_dir_all(&self.dir).map_err(|e| ReportError::create_dir(&self.dir, e))?;
        let body = render_records(records);

        let _guard = self.lock.acquire()?;

        let (path, rotated) = match mode {
            OutputMode::PerGroup => (per_group_path(&self.dir, label), false),
            OutputMode::Collection => {
                let today = Local::now().date_naive();
                let path = collection_path(&self.dir, label, today);
                let rotated =
                    rotate_if_stale(&path, today).map_err(|e| ReportError::write(&path, e))?;
                (path, rotated)
            }
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ReportError::open(&path, e))?;
        file.write_all(body.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| ReportError::write(&path, e))?;

        info!(
            report = %path,
            records = records.len(),
            mode = mode.label(),
            "Wrote failure report"
        );

        Ok(FlushOutcome {
            path: Some(path),
            written: records.len(),
            rotated,
        })
    }
}

/// Returns `<desktop>/INVALID_CDFs`, falling back to the home directory and
/// then the working directory.
///
/// # Errors
///
/// Returns [`ReportError::NonUtf8Path`] if the chosen directory is not UTF-8.
pub fn default_report_dir() -> Result<Utf8PathBuf, ReportError> {
    let base = dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .or_else(|| std::env::current_dir().ok())
        .ok_or(ReportError::NoReportDir)?;
    let base = Utf8PathBuf::from_path_buf(base).map_err(ReportError::NonUtf8Path)?;
    Ok(base.join(REPORT_FOLDER_NAME))
}

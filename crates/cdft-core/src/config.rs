//! Configuration structures for cdftester.
//!
//! - [`ScanConfig`] - Discovery settings (target extension, symlinks)
//! - [`ReportConfig`] - Report directory, host lock, and collection label
//! - [`DispatchConfig`] - Worker executable override
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] and deserialize with
//! `#[serde(default)]`, so a configuration file only needs the fields it
//! overrides.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{COLLECTION_LABEL, DEFAULT_TARGET_EXTENSION};

/// Name of the host-wide lock that serializes report writes.
pub const DEFAULT_LOCK_NAME: &str = "INVALID_CDF_LOG_FILE_MUTEX";

/// Folder created under the desktop (or home) directory for reports.
pub const REPORT_FOLDER_NAME: &str = "INVALID_CDFs";

/// Configuration for directory discovery.
///
/// # Examples
///
/// ```
/// use cdft_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert_eq!(config.target_extension, "cdf");
/// assert!(!config.follow_links);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extension (without the dot) of the files to probe.
    pub target_extension: String,

    /// Whether to follow symbolic links while walking roots.
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_extension: DEFAULT_TARGET_EXTENSION.to_owned(),
            follow_links: false,
        }
    }
}

/// Configuration for report files and the host-wide write lock.
///
/// # Examples
///
/// ```
/// use cdft_core::ReportConfig;
///
/// let config = ReportConfig::default();
/// assert!(config.report_dir.is_none());
/// assert_eq!(config.lock_name, "INVALID_CDF_LOG_FILE_MUTEX");
/// assert_eq!(config.collection_label, "InvalidCdfCollection");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory that receives report files.
    ///
    /// `None` means `<desktop>/INVALID_CDFs`, falling back to the home directory.
    pub report_dir: Option<Utf8PathBuf>,

    /// Name of the host-wide lock shared by every worker process.
    pub lock_name: String,

    /// Directory holding the lock file. `None` means the system temp directory.
    pub lock_dir: Option<Utf8PathBuf>,

    /// Label of the shared report file in collection mode.
    pub collection_label: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_dir: None,
            lock_name: DEFAULT_LOCK_NAME.to_owned(),
            lock_dir: None,
            collection_label: COLLECTION_LABEL.to_owned(),
        }
    }
}

/// Configuration for worker dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Executable started for each worker.
    ///
    /// `None` means the running binary re-executes itself in worker mode.
    pub worker_executable: Option<Utf8PathBuf>,
}

/// Root configuration for cdftester.
///
/// # Examples
///
/// ```
/// use cdft_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("target_extension"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discovery configuration.
    pub scan: ScanConfig,

    /// Report writer configuration.
    pub report: ReportConfig,

    /// Dispatcher configuration.
    pub dispatch: DispatchConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields take their default values. The loaded configuration is
    /// validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if the file does not exist,
    /// [`ConfigError::Io`] if it cannot be read, [`ConfigError::Parse`] if it is
    /// not valid JSON, and [`ConfigError::InvalidOption`] if validation fails.
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_owned()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that serde cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for an empty target extension,
    /// lock name, or collection label.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let extension = self.scan.target_extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(ConfigError::invalid_option(
                "scan.target_extension",
                "must not be empty",
            ));
        }
        if self.report.lock_name.trim().is_empty() {
            return Err(ConfigError::invalid_option(
                "report.lock_name",
                "must not be empty",
            ));
        }
        if self.report.collection_label.trim().is_empty() {
            return Err(ConfigError::invalid_option(
                "report.collection_label",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

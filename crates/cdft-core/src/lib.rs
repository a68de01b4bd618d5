//! Core types, configuration, and errors for the cdftester workspace.
//!
//! This crate provides the foundational types shared by the scanner, the
//! report writer, the dispatcher, and the CLI:
//!
//! - [`ConfigError`] for configuration loading failures
//! - [`Config`] and its component sections
//! - Domain types ([`TargetDirectory`], [`ProbeRecord`], [`FailureRecord`], [`OutputMode`])

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, DispatchConfig, ReportConfig, ScanConfig};
pub use error::ConfigError;
pub use types::{FailureKind, FailureRecord, OutputMode, ProbeRecord, TargetDirectory};

/// Report label used when a run writes all failures into one shared file.
pub const COLLECTION_LABEL: &str = "InvalidCdfCollection";

/// Default extension of the files subject to the open/close probe.
pub const DEFAULT_TARGET_EXTENSION: &str = "cdf";

//! Failure reports for cdftester.
//!
//! Workers on the same host append to the same report directory. Every
//! write goes through [`ReportWriter::flush`], which holds a host-wide
//! [`HostLock`] for the whole name-resolve, rotate, append sequence.
//!
//! # File names
//!
//! - Per-group: `<label>_<n>.txt`, `n` the smallest unused integer `>= 1`
//! - Collection: `<label>_<yyMMdd>.txt`, emptied on the first write of a new day
//!
//! # Example
//!
//! ```no_run
//! use cdft_core::{OutputMode, ReportConfig};
//! use cdft_report::ReportWriter;
//!
//! let writer = ReportWriter::from_config(&ReportConfig::default())?;
//! let outcome = writer.flush(&[], "InvalidCdfCollection", OutputMode::Collection)?;
//! if let Some(path) = outcome.path {
//!     println!("wrote {}", path);
//! }
//! # Ok::<(), cdft_report::ReportError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod format;
mod lock;
mod naming;
mod writer;

pub use error::ReportError;
pub use format::{render_block, render_records, SEPARATOR_WIDTH};
pub use lock::{HostLock, HostLockGuard};
pub use naming::{collection_path, per_group_path, rotate_if_stale};
pub use writer::{default_report_dir, FlushOutcome, ReportWriter};

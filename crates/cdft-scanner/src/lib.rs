//! Target directory discovery and fault-isolated CDF probing.
//!
//! This crate is the part of cdftester that runs inside a worker process,
//! plus the discovery pass the dispatcher uses to decide how many workers
//! to start.
//!
//! # Overview
//!
//! - [`Discovery`]: depth-first search for directories holding target files
//! - [`ProbeLibrary`]: the open/close seam to the data-format library
//! - [`Prober`]: opens and closes each file and classifies the outcome
//! - [`Tester`]: in-worker fan-out over directories with a shared failure list
//! - [`ProbeStats`]: atomic counters for logging
//!
//! # Architecture
//!
//! ```text
//! Tester (one per worker)
//!     │
//!     ├── Discovery (ignore::WalkBuilder, visited set)
//!     │
//!     └── Prober (rayon task per directory)
//!             │
//!             ├── ProbeLibrary::open / close
//!             ├── mtime before / after
//!             └── Mutex<Vec<FailureRecord>>
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cdft_core::{OutputMode, ScanConfig};
//! use cdft_scanner::{CdfHeaderLibrary, Tester};
//! use camino::Utf8PathBuf;
//!
//! let tester = Tester::new(CdfHeaderLibrary, ScanConfig::default(), "InvalidCdfCollection");
//! let output = tester.run(&[Utf8PathBuf::from("/data/TOFxEH/2013")], OutputMode::PerGroup);
//!
//! for failure in &output.failures {
//!     println!("{}: {}", failure.path, failure.description());
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod discover;
mod error;
mod library;
mod probe;
mod stats;
mod tester;

pub use discover::{discover, Discovery};
pub use error::{ProbeError, ScanError};
pub use library::{CdfHeaderLibrary, ProbeLibrary, CDF_MAGIC_NUMBERS};
pub use probe::Prober;
pub use stats::{ProbeStats, ProbeStatsSnapshot};
pub use tester::{Tester, TesterOutput};

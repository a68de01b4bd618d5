//! Fault-isolated worker dispatch for cdftester.
//!
//! Every target directory is probed in its own OS process. A hard fault in
//! the probe library (segfault, abort) takes down only that worker; the
//! dispatcher sees the exit, reaps the worker, and keeps waiting for the
//! rest.
//!
//! # Overview
//!
//! - [`WorkerCommand`]: builds `<exe> [prefix...] --worker [--coll] <dir>`
//! - [`Dispatcher`]: spawns workers and reaps them through an mpsc channel
//! - [`ProgressTracker`]: console progress, remaining-time estimate, total time
//! - [`DispatchSummary`]: per-worker [`WorkerOutcome`]s and spawn failures
//!
//! # Example
//!
//! ```no_run
//! use cdft_core::{OutputMode, TargetDirectory};
//! use cdft_dispatch::{Dispatcher, WorkerCommand};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cdft_dispatch::DispatchError> {
//!     let command = WorkerCommand::current_exe(OutputMode::Collection)?;
//!     let dirs = vec![
//!         TargetDirectory::new("/data/HOPE/2014".into()),
//!         TargetDirectory::new("/data/HOPE/2015".into()),
//!     ];
//!
//!     let summary = Dispatcher::new(command).dispatch(&dirs).await?;
//!     assert_eq!(summary.outcomes.len() + summary.spawn_failures.len(), 2);
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod command;
mod dispatcher;
mod error;
mod outcome;
mod progress;

pub use command::{WorkerCommand, COLLECTION_FLAG, WORKER_FLAG};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use outcome::{DispatchSummary, SpawnFailure, WorkerExit, WorkerOutcome};
pub use progress::{estimate_remaining, format_elapsed, ProgressTracker};

//! Domain types for cdftester.
//!
//! - [`directory`] - Discovered target directories and their group labels
//! - [`record`] - Probe results and persisted failure records
//! - [`mode`] - Report output mode
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use cdft_core::{FailureRecord, OutputMode, TargetDirectory};
//! ```

mod directory;
mod mode;
mod record;

pub use directory::TargetDirectory;
pub use mode::OutputMode;
pub use record::{FailureKind, FailureRecord, ProbeRecord};

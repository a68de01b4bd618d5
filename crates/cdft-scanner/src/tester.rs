//! In-worker probing and failure aggregation.
//!
//! A worker is normally handed exactly one directory. [`Tester`] still
//! accepts any number of roots: it runs discovery over them, probes every
//! target directory on its own rayon task, and gathers failures into one
//! list guarded by a mutex. The guard lives only for a single push, so it is
//! released on every path out of the probe.
//!
//! # Labels
//!
//! When discovery yields one directory, its group label names the report.
//! When it yields several, or collection output was requested, the run
//! becomes a collection and the collection label is used instead.

use camino::Utf8Path;
use cdft_core::{FailureRecord, OutputMode, ScanConfig, TargetDirectory};
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::discover::Discovery;
use crate::library::ProbeLibrary;
use crate::probe::Prober;
use crate::stats::ProbeStatsSnapshot;

/// Everything a worker needs to flush its report.
#[derive(Debug)]
pub struct TesterOutput {
    /// Report label for this run.
    pub label: String,
    /// Effective output mode.
    pub mode: OutputMode,
    /// Directories that were probed.
    pub directories: Vec<TargetDirectory>,
    /// Failure records from every directory.
    pub failures: Vec<FailureRecord>,
    /// Probe counters at the end of the run.
    pub stats: ProbeStatsSnapshot,
}

/// Runs discovery and probing inside one worker.
///
/// # Examples
///
/// ```no_run
/// use cdft_core::{OutputMode, ScanConfig};
/// use cdft_scanner::{CdfHeaderLibrary, Tester};
/// use camino::Utf8PathBuf;
///
/// let tester = Tester::new(CdfHeaderLibrary, ScanConfig::default(), "InvalidCdfCollection");
/// let output = tester.run(&[Utf8PathBuf::from("/data/TOFxEH/2013")], OutputMode::PerGroup);
/// println!("{} failures for {}", output.failures.len(), output.label);
/// ```
#[derive(Debug)]
pub struct Tester<L> {
    prober: Prober<L>,
    config: ScanConfig,
    collection_label: String,
}

impl<L: ProbeLibrary> Tester<L> {
    /// Creates a tester.
    #[must_use]
    pub fn new(library: L, config: ScanConfig, collection_label: impl Into<String>) -> Self {
        Self {
            prober: Prober::new(library, &config),
            config,
            collection_label: collection_label.into(),
        }
    }

    /// Discovers and probes everything under `roots`.
    #[must_use]
    pub fn run<P: AsRef<Utf8Path>>(&self, roots: &[P], requested: OutputMode) -> TesterOutput {
        let directories = Discovery::new(&self.config).discover(roots);
        self.run_directories(directories, requested)
    }

    /// Probes exactly the given directories, without descending into them.
    ///
    /// This is what a dispatched worker runs: subdirectories of its directory
    /// belong to other workers.
    #[must_use]
    pub fn run_directories(
        &self,
        directories: Vec<TargetDirectory>,
        requested: OutputMode,
    ) -> TesterOutput {
        let (label, mode) = self.resolve_label(&directories, requested);

        let failures = Mutex::new(Vec::new());
        directories.par_iter().for_each(|dir| {
            let result = self
                .prober
                .probe_directory_with(dir, |failure| failures.lock().push(failure));
            if let Err(e) = result {
                warn!(dir = %dir.path(), error = %e, "Unable to probe directory");
            }
        });

        let failures = failures.into_inner();
        let stats = self.prober.stats().snapshot();
        info!(
            label = %label,
            directories = directories.len(),
            probed = stats.probed,
            failures = failures.len(),
            "Worker probing finished"
        );

        TesterOutput {
            label,
            mode,
            directories,
            failures,
            stats,
        }
    }

    /// Picks the report label and effective mode for a set of directories.
    fn resolve_label(
        &self,
        directories: &[TargetDirectory],
        requested: OutputMode,
    ) -> (String, OutputMode) {
        match directories {
            [] => (self.collection_label.clone(), requested),
            [single] if !requested.is_collection() => {
                (single.label().to_owned(), OutputMode::PerGroup)
            }
            _ => (self.collection_label.clone(), OutputMode::Collection),
        }
    }
}

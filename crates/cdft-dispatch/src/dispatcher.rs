//! The worker dispatcher.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       Dispatcher::dispatch                    │
//! │                                                               │
//! │   for each TargetDirectory ──spawn──> worker process          │
//! │                                           │                   │
//! │                                  tokio task: child.wait()     │
//! │                                           │                   │
//! │                              mpsc::UnboundedSender<Exited>    │
//! │                                           ▼                   │
//! │   active set (FxHashMap<id, WorkerHandle>) <── recv loop      │
//! │                                           │                   │
//! │                                    ProgressTracker            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each directory gets its own OS process, so a fault in the probe library
//! kills one worker and the rest keep running. The loop returns once the
//! active set is empty. There is no timeout: a hung worker blocks the run.

use std::io::{self, Write};
use std::process::ExitStatus;
use std::time::Instant;

use cdft_core::TargetDirectory;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::WorkerCommand;
use crate::error::DispatchError;
use crate::outcome::{DispatchSummary, SpawnFailure, WorkerExit, WorkerHandle};
use crate::progress::ProgressTracker;

/// Exit notification sent by a worker's wait task.
#[derive(Debug)]
struct WorkerExited {
    id: usize,
    status: io::Result<ExitStatus>,
}

/// Starts one worker process per directory and waits for all of them.
///
/// # Examples
///
/// ```no_run
/// use cdft_core::{OutputMode, TargetDirectory};
/// use cdft_dispatch::{Dispatcher, WorkerCommand};
///
/// # async fn example() -> Result<(), cdft_dispatch::DispatchError> {
/// let command = WorkerCommand::current_exe(OutputMode::PerGroup)?;
/// let mut dispatcher = Dispatcher::new(command);
///
/// let dirs = vec![TargetDirectory::new("/data/TOFxEH/2013".into())];
/// let summary = dispatcher.dispatch(&dirs).await?;
/// println!("{} workers, {} crashed", summary.started, summary.crashed());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Dispatcher<W = io::Stdout> {
    command: WorkerCommand,
    progress: ProgressTracker<W>,
}

impl Dispatcher<io::Stdout> {
    /// Creates a dispatcher that prints progress to standard output.
    #[must_use]
    pub fn new(command: WorkerCommand) -> Self {
        Self::with_progress(command, ProgressTracker::stdout())
    }
}

impl<W: Write> Dispatcher<W> {
    /// Creates a dispatcher with a custom progress sink.
    pub fn with_progress(command: WorkerCommand, progress: ProgressTracker<W>) -> Self {
        Self { command, progress }
    }

    /// Returns the worker command.
    #[inline]
    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }

    /// Consumes the dispatcher and returns its progress tracker.
    pub fn into_progress(self) -> ProgressTracker<W> {
        self.progress
    }

    /// Runs one worker per directory and blocks until every worker has exited.
    ///
    /// A worker that fails to start is recorded in the summary and the run
    /// continues with the remaining directories.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingExecutable`] before anything is started
    /// if the worker executable does not exist.
    pub async fn dispatch(
        &mut self,
        dirs: &[TargetDirectory],
    ) -> Result<DispatchSummary, DispatchError> {
        self.command.verify()?;

        let run_started = Instant::now();
        let mut summary = DispatchSummary::default();
        let mut active: FxHashMap<usize, WorkerHandle> = FxHashMap::default();
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkerExited>();

        info!(
            workers = dirs.len(),
            program = %self.command.program(),
            mode = self.command.mode().label(),
            "Dispatching workers"
        );

        for (id, dir) in dirs.iter().enumerate() {
            let mut child = match self.command.build(dir).spawn() {
                Ok(child) => child,
                Err(e) => {
                    let error = DispatchError::spawn(dir.label(), e);
                    warn!(dir = %dir.path(), error = %error, "Unable to start worker");
                    summary.spawn_failures.push(SpawnFailure {
                        path: dir.path().to_owned(),
                        error,
                    });
                    continue;
                }
            };

            let pid = child.id();
            debug!(id, pid, label = %dir.label(), "Worker started");
            self.progress.on_spawned(pid, dir.label());
            active.insert(id, WorkerHandle::new(pid, dir.label()));

            let tx = tx.clone();
            tokio::spawn(async move {
                let status = child.wait().await;
                // The receiver only goes away once every worker is accounted for
                let _ = tx.send(WorkerExited { id, status });
            });
        }
        drop(tx);

        summary.started = active.len();
        self.progress.on_started(active.len());

        while !active.is_empty() {
            let Some(event) = rx.recv().await else {
                break;
            };
            let Some(handle) = active.remove(&event.id) else {
                continue;
            };

            let exit = match event.status {
                Ok(status) => WorkerExit::from_status(status),
                Err(e) => {
                    warn!(label = %handle.label, error = %e, "Unable to reap worker");
                    WorkerExit::Unknown
                }
            };

            let outcome = handle.into_outcome(exit);
            self.progress.on_exit(&outcome, active.len());
            summary.outcomes.push(outcome);
        }

        // Only reachable if a wait task died without reporting
        for handle in active.into_values() {
            warn!(label = %handle.label, "Worker exit was never reported");
            summary.outcomes.push(handle.into_outcome(WorkerExit::Unknown));
        }

        summary.elapsed = run_started.elapsed();
        self.progress.finish(summary.elapsed);

        info!(
            started = summary.started,
            succeeded = summary.succeeded(),
            crashed = summary.crashed(),
            spawn_failures = summary.spawn_failures.len(),
            "All workers finished"
        );

        Ok(summary)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::time::Duration;

    use camino::Utf8PathBuf;
    use cdft_core::OutputMode;
    use tempfile::TempDir;

    use super::*;

    /// Fake worker: crashes for `*crash*` directories, exits 3 for `*fail*`,
    /// sleeps briefly for `*slow*`, and succeeds otherwise.
    const FAKE_WORKER: &str = r#"
for dir; do :; done
case "$dir" in
    *crash*) kill -SEGV $$ ;;
    *fail*) exit 3 ;;
    *slow*) sleep 0.2 ;;
esac
exit 0
"#;

    fn fake_worker(mode: OutputMode) -> WorkerCommand {
        WorkerCommand::new("/bin/sh", mode).with_prefix_args(["-c", FAKE_WORKER, "worker"])
    }

    fn dirs(names: &[&str]) -> Vec<TargetDirectory> {
        names
            .iter()
            .map(|name| TargetDirectory::new(Utf8PathBuf::from(format!("/data/{name}"))))
            .collect()
    }

    fn dispatcher(command: WorkerCommand) -> Dispatcher<Vec<u8>> {
        Dispatcher::with_progress(command, ProgressTracker::new(Vec::new()))
    }

    fn console(dispatcher: Dispatcher<Vec<u8>>) -> String {
        String::from_utf8(dispatcher.into_progress().into_inner()).unwrap()
    }

    #[tokio::test]
    async fn test_all_workers_succeed() {
        let mut dispatcher = dispatcher(fake_worker(OutputMode::PerGroup));
        let summary = dispatcher
            .dispatch(&dirs(&["TOFxEH/2013", "TOFxEH/2014", "HOPE/slow"]))
            .await
            .unwrap();

        assert_eq!(summary.started, 3);
        assert_eq!(summary.outcomes.len(), 3);
        assert!(summary.is_clean());
        assert!(summary.elapsed >= Duration::from_millis(200));

        let console = console(dispatcher);
        assert_eq!(console.matches("has exited.").count(), 3);
        assert!(console.contains("TOFxEH2013 has exited."));
        assert!(console.contains("Total execution time: "));
    }

    #[tokio::test]
    async fn test_crash_is_isolated() {
        let mut dispatcher = dispatcher(fake_worker(OutputMode::PerGroup));
        let summary = dispatcher
            .dispatch(&dirs(&["HOPE/2014", "HOPE/crash", "HOPE/fail", "HOPE/slow"]))
            .await
            .unwrap();

        assert_eq!(summary.outcomes.len(), 4);
        assert_eq!(summary.crashed(), 1);
        assert_eq!(summary.succeeded(), 2);

        let crashed = summary
            .outcomes
            .iter()
            .find(|o| o.label == "HOPEcrash")
            .unwrap();
        assert_eq!(crashed.exit, WorkerExit::Crashed { signal: 11 });

        let failed = summary.outcomes.iter().find(|o| o.label == "HOPEfail").unwrap();
        assert_eq!(failed.exit, WorkerExit::Failed { code: 3 });
    }

    #[tokio::test]
    async fn test_collection_flag_reaches_worker() {
        let temp = TempDir::new().unwrap();
        let marker = Utf8PathBuf::from_path_buf(temp.path().join("args")).unwrap();
        let script = format!(r#"echo "$@" >> "{marker}""#);
        let command = WorkerCommand::new("/bin/sh", OutputMode::Collection)
            .with_prefix_args(["-c", script.as_str(), "worker"]);

        let mut dispatcher = dispatcher(command);
        dispatcher.dispatch(&dirs(&["TOFxEH/2013"])).await.unwrap();

        let args = fs::read_to_string(&marker).unwrap();
        assert_eq!(args.trim(), "--worker --coll /data/TOFxEH/2013");
    }

    #[tokio::test]
    async fn test_missing_executable_aborts() {
        let mut dispatcher = dispatcher(WorkerCommand::new(
            "/nonexistent/cdftester",
            OutputMode::PerGroup,
        ));
        let err = dispatcher.dispatch(&dirs(&["A/B"])).await.unwrap_err();

        assert!(matches!(err, DispatchError::MissingExecutable(_)));
        assert!(console(dispatcher).is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failures_do_not_stop_the_run() {
        // Exists but has no execute permission
        let temp = TempDir::new().unwrap();
        let program = Utf8PathBuf::from_path_buf(temp.path().join("cdftester")).unwrap();
        fs::write(&program, "not a program").unwrap();

        let mut dispatcher = dispatcher(WorkerCommand::new(program.clone(), OutputMode::PerGroup));
        let summary = dispatcher.dispatch(&dirs(&["A/B", "C/D"])).await.unwrap();

        assert_eq!(summary.started, 0);
        assert_eq!(summary.spawn_failures.len(), 2);
        assert!(summary.spawn_failures[0].error.is_recoverable());
        assert!(console(dispatcher).contains("Total execution time: "));
    }

    #[tokio::test]
    async fn test_no_directories() {
        let mut dispatcher = dispatcher(fake_worker(OutputMode::PerGroup));
        let summary = dispatcher.dispatch(&[]).await.unwrap();

        assert_eq!(summary.started, 0);
        assert!(summary.outcomes.is_empty());
    }
}

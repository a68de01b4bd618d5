//! CLI entry point for cdftester.
//!
//! The same binary runs in two roles. Started normally it discovers every
//! directory holding CDF files and dispatches one worker process per
//! directory. Started with the hidden `--worker` flag it probes the
//! directory it was given and appends failures to the shared report.
//!
//! # Usage
//!
//! ```bash
//! cdftester [OPTIONS] <ROOTS>...
//!
//! # One report per directory group
//! cdftester /data/TOFxEH /data/HOPE
//!
//! # One shared report for the whole run, rotated daily
//! cdftester --coll /data
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::Utf8PathBuf;
use cdft_core::{Config, OutputMode, TargetDirectory};
use cdft_dispatch::{format_elapsed, DispatchError, Dispatcher, WorkerCommand};
use cdft_report::ReportWriter;
use cdft_scanner::{discover, CdfHeaderLibrary, Tester};
use clap::Parser;
use color_eyre::eyre::eyre;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Fault-isolated CDF integrity scanner.
///
/// Opens and closes every `.cdf` file under the given roots, one worker
/// process per directory, and reports files that fail to open or close or
/// whose modification time changes as a result.
#[derive(Parser, Debug)]
#[command(name = "cdftester", version, about, long_about = None)]
struct Cli {
    /// Root directories to scan.
    #[arg(required = true)]
    roots: Vec<Utf8PathBuf>,

    /// Write every failure into one shared collection report.
    #[arg(long = "coll")]
    collection: bool,

    /// JSON configuration file.
    #[arg(short, long, env = "CDFTESTER_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Directory that receives report files.
    ///
    /// Defaults to `INVALID_CDFs` on the desktop (or in the home directory).
    #[arg(long, env = "CDFTESTER_REPORT_DIR")]
    report_dir: Option<Utf8PathBuf>,

    /// Executable started for each worker (defaults to this binary).
    #[arg(long, env = "CDFTESTER_WORKER_EXE")]
    worker_exe: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,

    /// Run as a worker on the given directory.
    #[arg(long, hide = true)]
    worker: bool,
}

impl Cli {
    /// Options a worker needs to see the same settings as its dispatcher.
    fn forwarded_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(config) = &self.config {
            args.extend(["--config".to_owned(), config.to_string()]);
        }
        if let Some(dir) = &self.report_dir {
            args.extend(["--report-dir".to_owned(), dir.to_string()]);
        }
        if self.verbose {
            args.push("--verbose".to_owned());
        }
        if self.no_color {
            args.push("--no-color".to_owned());
        }
        args
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},ignore=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the optional config file and CLI overrides.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if let Some(dir) = &cli.report_dir {
        config.report.report_dir = Some(dir.clone());
    }
    if let Some(exe) = &cli.worker_exe {
        config.dispatch.worker_executable = Some(exe.clone());
    }

    Ok(config)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Probes the files directly inside the given directories and flushes the
/// failures.
///
/// A report that cannot be written is logged and its records are dropped;
/// the worker still exits successfully.
fn run_worker(cli: &Cli, config: &Config) -> color_eyre::Result<()> {
    let mode = OutputMode::from_collection_flag(cli.collection);
    let tester = Tester::new(
        CdfHeaderLibrary,
        config.scan.clone(),
        config.report.collection_label.clone(),
    );

    // Subdirectories are dispatched to their own workers, so no walking here
    let dirs: Vec<TargetDirectory> = cli
        .roots
        .iter()
        .filter_map(|root| match root.canonicalize_utf8() {
            Ok(path) if path.is_dir() => Some(TargetDirectory::new(path)),
            Ok(path) => {
                warn!(path = %path, "Worker root is not a directory");
                None
            }
            Err(e) => {
                warn!(path = %root, error = %e, "Unable to resolve worker root");
                None
            }
        })
        .collect();
    let output = tester.run_directories(dirs, mode);

    let flushed = ReportWriter::from_config(&config.report)
        .and_then(|writer| writer.flush(&output.failures, &output.label, output.mode));

    match flushed {
        Ok(outcome) => {
            if let Some(path) = outcome.path {
                info!(report = %path, records = outcome.written, "Failures reported");
            }
        }
        Err(e) => {
            error!(
                label = %output.label,
                dropped = output.failures.len(),
                error = %e,
                "Unable to write report"
            );
            let target = e.path().map_or_else(|| e.to_string(), ToString::to_string);
            let _ = writeln!(std::io::stderr().lock(), "Unable to access file: {target}");
        }
    }

    Ok(())
}

/// Discovers target directories and runs one worker per directory.
async fn run_dispatch(cli: &Cli, config: &Config) -> color_eyre::Result<()> {
    let dirs = discover(&cli.roots, &config.scan);
    let stdout = std::io::stdout();

    if dirs.is_empty() {
        warn!(roots = cli.roots.len(), "No directories with target files found");
        let _ = writeln!(
            stdout.lock(),
            "No .{} files found under the given roots.",
            config.scan.target_extension
        );
        return Ok(());
    }

    let mode = OutputMode::from_collection_flag(cli.collection);
    let command = match &config.dispatch.worker_executable {
        Some(exe) => WorkerCommand::new(exe.clone(), mode),
        None => WorkerCommand::current_exe(mode)?,
    }
    .with_prefix_args(cli.forwarded_args());

    info!(directories = dirs.len(), mode = mode.label(), "Starting scan");

    let summary = match Dispatcher::new(command).dispatch(&dirs).await {
        Ok(summary) => summary,
        Err(e @ DispatchError::MissingExecutable(_)) => {
            return Err(eyre!("{e}; cannot start any worker, aborting"));
        }
        Err(e) => return Err(e.into()),
    };

    let report_dir = ReportWriter::from_config(&config.report)?.dir().to_owned();
    let mut handle = stdout.lock();
    for failure in &summary.spawn_failures {
        let _ = writeln!(handle, "Skipped {}: {}", failure.path, failure.error);
    }
    if let Some(notice) = summary.crash_notice() {
        let _ = writeln!(handle, "{notice}");
    }
    let _ = writeln!(handle, "Check {report_dir} for the logs.");

    info!(
        total = %format_elapsed(summary.elapsed),
        workers = summary.started,
        "Scan complete"
    );

    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments (prints usage when no roots are given)
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Load configuration, then route by role
    let config = build_config(&cli)?;
    if cli.worker {
        run_worker(&cli, &config)
    } else {
        run_dispatch(&cli, &config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_are_required() {
        assert!(Cli::try_parse_from(["cdftester"]).is_err());
    }

    #[test]
    fn test_worker_command_line() {
        let cli =
            Cli::try_parse_from(["cdftester", "--worker", "--coll", "/data/TOFxEH/2013"]).unwrap();
        assert!(cli.worker);
        assert!(cli.collection);
        assert_eq!(cli.roots, [Utf8PathBuf::from("/data/TOFxEH/2013")]);
    }

    #[test]
    fn test_forwarded_args() {
        let cli = Cli::try_parse_from([
            "cdftester",
            "--report-dir",
            "/srv/reports",
            "-v",
            "/data",
        ])
        .unwrap();
        assert_eq!(
            cli.forwarded_args(),
            ["--report-dir", "/srv/reports", "--verbose"]
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "cdftester",
            "--report-dir",
            "/srv/reports",
            "--worker-exe",
            "/opt/cdftester",
            "/data",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(
            config.report.report_dir,
            Some(Utf8PathBuf::from("/srv/reports"))
        );
        assert_eq!(
            config.dispatch.worker_executable,
            Some(Utf8PathBuf::from("/opt/cdftester"))
        );
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

//! End-to-end worker scenarios: probe a tree, then flush the failures.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use cdft_core::{OutputMode, ScanConfig, TargetDirectory, COLLECTION_LABEL};
use cdft_report::{collection_path, HostLock, ReportWriter};
use cdft_scanner::{ProbeError, ProbeLibrary, Tester};
use chrono::Local;
use tempfile::TempDir;

/// Fails to open any file whose name starts with `bad`.
struct RejectBad;

impl ProbeLibrary for RejectBad {
    type Handle = ();

    fn open(&self, path: &Utf8Path) -> Result<(), ProbeError> {
        match path.file_name() {
            Some(name) if name.starts_with("bad") => Err(ProbeError::new("CDF_OPEN_ERROR")),
            _ => Ok(()),
        }
    }

    fn close(&self, _handle: ()) -> Result<(), ProbeError> {
        Ok(())
    }
}

struct Workspace {
    _temp: TempDir,
    data: Utf8PathBuf,
    writer: ReportWriter,
    reports: Utf8PathBuf,
}

fn workspace(files: &[&str]) -> Workspace {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().canonicalize().unwrap()).unwrap();
    let data = root.join("data");
    for file in files {
        let path = data.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"cdf").unwrap();
    }
    let reports = root.join("INVALID_CDFs");
    let writer = ReportWriter::new(&reports, HostLock::new(&root, "SCENARIO_MUTEX"));
    Workspace {
        _temp: temp,
        data,
        writer,
        reports,
    }
}

fn run_worker(ws: &Workspace, root: &Utf8Path, mode: OutputMode) -> Option<Utf8PathBuf> {
    let tester = Tester::new(RejectBad, ScanConfig::default(), COLLECTION_LABEL);
    // Workers probe only the directory they are handed
    let dir = TargetDirectory::new(root.canonicalize_utf8().unwrap());
    let output = tester.run_directories(vec![dir], mode);
    ws.writer
        .flush(&output.failures, &output.label, output.mode)
        .unwrap()
        .path
}

#[test]
fn test_single_group_report() {
    let ws = workspace(&[
        "TOFxEH/2013/a.cdf",
        "TOFxEH/2013/bad.cdf",
        "TOFxEH/2013/c.cdf",
    ]);

    let path = run_worker(&ws, &ws.data.join("TOFxEH/2013"), OutputMode::PerGroup).unwrap();

    assert_eq!(path, ws.reports.join("TOFxEH2013_1.txt"));
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.matches("############").count(), 2);
    assert_eq!(contents.matches("############    CDF_OPEN_ERROR").count(), 1);
    assert_eq!(contents.lines().count(), 5);
    assert!(contents.contains("TOFxEH/2013/bad.cdf"));
}

#[test]
fn test_worker_leaves_subdirectories_alone() {
    let ws = workspace(&["HOPE/bad0.cdf", "HOPE/2014/bad1.cdf"]);

    let path = run_worker(&ws, &ws.data.join("HOPE"), OutputMode::PerGroup).unwrap();

    assert_eq!(path, ws.reports.join("dataHOPE_1.txt"));
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 5);
    assert!(contents.contains("HOPE/bad0.cdf"));
    assert!(!contents.contains("bad1.cdf"));
}

#[test]
fn test_clean_directory_creates_no_report() {
    let ws = workspace(&["TOFxEH/2014/a.cdf"]);

    assert!(run_worker(&ws, &ws.data.join("TOFxEH/2014"), OutputMode::PerGroup).is_none());
    assert!(!ws.reports.exists());
}

#[test]
fn test_two_groups_in_collection_mode() {
    let ws = workspace(&["HOPE/2014/bad1.cdf", "HOPE/2015/bad2.cdf", "HOPE/2015/ok.cdf"]);

    // One worker per directory, as the dispatcher would run them
    for year in ["2014", "2015"] {
        run_worker(&ws, &ws.data.join("HOPE").join(year), OutputMode::Collection);
    }

    let expected = collection_path(&ws.reports, COLLECTION_LABEL, Local::now().date_naive());
    let entries: Vec<_> = fs::read_dir(&ws.reports).unwrap().collect();
    assert_eq!(entries.len(), 1);

    let contents = fs::read_to_string(&expected).unwrap();
    assert_eq!(contents.matches("CDF_OPEN_ERROR").count(), 2);
}

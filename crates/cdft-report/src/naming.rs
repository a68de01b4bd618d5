//! Report file naming and daily rotation.
//!
//! Per-group reports are `<label>_<n>.txt` with the smallest unused `n >= 1`,
//! so a new run never overwrites an earlier one. Collection reports are
//! `<label>_<yyMMdd>.txt` and are emptied on the first write of a new day.
//!
//! Both functions must run while the host lock is held: resolution is a
//! check-then-create and rotation is a check-then-truncate.

use std::fs::{self, OpenOptions};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local, NaiveDate};
use tracing::info;

/// Returns the first `<label>_<n>.txt` in `dir` that does not exist yet.
#[must_use]
pub fn per_group_path(dir: &Utf8Path, label: &str) -> Utf8PathBuf {
    let mut n: u64 = 1;
    loop {
        let candidate = dir.join(format!("{label}_{n}.txt"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Returns the collection report path for `date`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use cdft_report::collection_path;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// let path = collection_path(Utf8Path::new("/reports"), "InvalidCdfCollection", date);
/// assert_eq!(path.as_str(), "/reports/InvalidCdfCollection_240309.txt");
/// ```
#[must_use]
pub fn collection_path(dir: &Utf8Path, label: &str, date: NaiveDate) -> Utf8PathBuf {
    dir.join(format!("{label}_{}.txt", date.format("%y%m%d")))
}

/// Empties `path` if it was last modified on a calendar day before `today`.
///
/// Returns `true` when the file was truncated. A missing file is not an error.
pub fn rotate_if_stale(path: &Utf8Path, today: NaiveDate) -> io::Result<bool> {
    let modified = match fs::metadata(path) {
        Ok(meta) => meta.modified()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    let last_day = DateTime::<Local>::from(modified).date_naive();
    if last_day >= today {
        return Ok(false);
    }

    OpenOptions::new().write(true).truncate(true).open(path)?;
    info!(report = %path, last_modified = %last_day, "Rotated stale collection report");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    use tempfile::TempDir;

    use super::*;

    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        (temp, dir)
    }

    #[test]
    fn test_per_group_first_number() {
        let (_temp, dir) = temp_dir();
        assert_eq!(per_group_path(&dir, "TOFxEH2013"), dir.join("TOFxEH2013_1.txt"));
    }

    #[test]
    fn test_per_group_skips_existing() {
        let (_temp, dir) = temp_dir();
        for n in 1..=3 {
            fs::write(dir.join(format!("A_{n}.txt")), "old").unwrap();
        }
        assert_eq!(per_group_path(&dir, "A"), dir.join("A_4.txt"));
    }

    #[test]
    fn test_per_group_fills_gap() {
        let (_temp, dir) = temp_dir();
        fs::write(dir.join("A_1.txt"), "old").unwrap();
        fs::write(dir.join("A_3.txt"), "old").unwrap();
        assert_eq!(per_group_path(&dir, "A"), dir.join("A_2.txt"));
    }

    #[test]
    fn test_collection_path_format() {
        let date = NaiveDate::from_ymd_opt(2013, 12, 31).unwrap();
        let path = collection_path(Utf8Path::new("/r"), "InvalidCdfCollection", date);
        assert_eq!(path.as_str(), "/r/InvalidCdfCollection_131231.txt");
    }

    #[test]
    fn test_rotate_missing_file() {
        let (_temp, dir) = temp_dir();
        let today = Local::now().date_naive();
        assert!(!rotate_if_stale(&dir.join("nope.txt"), today).unwrap());
    }

    #[test]
    fn test_rotate_keeps_todays_file() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("InvalidCdfCollection_x.txt");
        fs::write(&path, "today's blocks").unwrap();

        let today = Local::now().date_naive();
        assert!(!rotate_if_stale(&path, today).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "today's blocks");
    }

    #[test]
    fn test_rotate_truncates_stale_file() {
        let (_temp, dir) = temp_dir();
        let path = dir.join("InvalidCdfCollection_x.txt");
        fs::write(&path, "yesterday's blocks").unwrap();

        let two_days_ago = SystemTime::now() - Duration::from_secs(2 * 24 * 60 * 60);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(two_days_ago)
            .unwrap();

        let today = Local::now().date_naive();
        assert!(rotate_if_stale(&path, today).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}

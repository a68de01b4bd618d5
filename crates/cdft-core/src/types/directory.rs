//! Target directory type.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A directory confirmed to directly contain one or more target files.
///
/// The group label joins the names of the last two path segments, so
/// `/data/TOFxEH/2013` becomes `TOFxEH2013`. Reports in per-group mode are
/// named after it.
///
/// # Examples
///
/// ```
/// use cdft_core::TargetDirectory;
/// use camino::Utf8PathBuf;
///
/// let dir = TargetDirectory::new(Utf8PathBuf::from("/data/TOFxEH/2013"));
/// assert_eq!(dir.label(), "TOFxEH2013");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetDirectory {
    path: Utf8PathBuf,
    label: String,
}

impl TargetDirectory {
    /// Creates a target directory and derives its group label.
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        let label = group_label(&path);
        Self { path, label }
    }

    /// Returns the absolute path of the directory.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the group label (parent name + directory name).
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for TargetDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.path)
    }
}

/// Derives `<parent-name><dir-name>` from the last two segments of `path`.
fn group_label(path: &Utf8Path) -> String {
    let name = path.file_name().unwrap_or("root");
    match path.parent().and_then(Utf8Path::file_name) {
        Some(parent) => format!("{parent}{name}"),
        None => name.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_joins_last_two_segments() {
        let dir = TargetDirectory::new(Utf8PathBuf::from("/data/TOFxEH/2013"));
        assert_eq!(dir.label(), "TOFxEH2013");
        assert_eq!(dir.path().as_str(), "/data/TOFxEH/2013");
    }

    #[test]
    fn test_label_single_segment() {
        let dir = TargetDirectory::new(Utf8PathBuf::from("/archive"));
        assert_eq!(dir.label(), "archive");
    }

    #[test]
    fn test_label_filesystem_root() {
        let dir = TargetDirectory::new(Utf8PathBuf::from("/"));
        assert_eq!(dir.label(), "root");
    }

    #[test]
    fn test_display() {
        let dir = TargetDirectory::new(Utf8PathBuf::from("/data/HOPE/2014"));
        assert_eq!(dir.to_string(), "HOPE2014 (/data/HOPE/2014)");
    }
}

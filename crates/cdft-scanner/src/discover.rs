//! Discovery of target directories.
//!
//! This module provides [`Discovery`], a depth-first search over a set of
//! roots that yields every directory directly containing at least one target
//! file.
//!
//! # Rules
//!
//! - Roots that do not exist (or are not directories) are dropped without error
//! - A directory that holds target files is emitted and still descended into
//! - Every directory is visited at most once per run, so a root nested inside
//!   another root (or listed twice) is not scanned again
//! - Unreadable entries and non-UTF-8 paths are logged and skipped
//!
//! # Examples
//!
//! ```no_run
//! use cdft_core::ScanConfig;
//! use cdft_scanner::Discovery;
//! use camino::Utf8PathBuf;
//!
//! let dirs = Discovery::new(&ScanConfig::default())
//!     .discover(&[Utf8PathBuf::from("/data/TOFxEH")]);
//!
//! for dir in &dirs {
//!     println!("{}: {}", dir.label(), dir.path());
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cdft_core::{ScanConfig, TargetDirectory};
use ignore::WalkBuilder;
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::error::ScanError;

/// A single discovery run over an ordered set of roots.
///
/// Owns the visited-directory set, so repeated or overlapping roots never
/// cause a directory to be walked or emitted twice.
#[derive(Debug)]
pub struct Discovery {
    /// Extension (without the dot) of target files.
    extension: String,
    /// Whether to follow symbolic links.
    follow_links: bool,
    /// Directories already walked in this run.
    visited: FxHashSet<PathBuf>,
    /// Emitted directories, by path.
    emitted: FxHashSet<Utf8PathBuf>,
    /// Emitted directories, in discovery order.
    found: Vec<TargetDirectory>,
}

impl Discovery {
    /// Creates a discovery run for the given scan configuration.
    #[must_use]
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            extension: config.target_extension.trim_start_matches('.').to_owned(),
            follow_links: config.follow_links,
            visited: FxHashSet::default(),
            emitted: FxHashSet::default(),
            found: Vec::new(),
        }
    }

    /// Walks every root in order and returns the discovered target directories.
    #[must_use]
    pub fn discover<P: AsRef<Utf8Path>>(mut self, roots: &[P]) -> Vec<TargetDirectory> {
        for root in roots {
            let root = root.as_ref();
            match root.canonicalize_utf8() {
                Ok(canonical) if canonical.is_dir() => self.walk_root(&canonical),
                Ok(_) => debug!(root = %root, "Skipping root that is not a directory"),
                Err(e) => debug!(root = %root, error = %e, "Skipping missing root"),
            }
        }

        info!(count = self.found.len(), "Discovered target directories");
        self.found
    }

    /// Depth-first walk of one root, pruning directories visited earlier.
    fn walk_root(&mut self, root: &Utf8Path) {
        if self.visited.contains(root.as_std_path()) {
            debug!(root = %root, "Root already visited");
            return;
        }

        let seen = Arc::new(self.visited.clone());
        let walker = WalkBuilder::new(root)
            // Data archives are not source trees: keep hidden and ignored entries
            .standard_filters(false)
            .follow_links(self.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| !seen.contains(entry.path()))
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %ScanError::from(e), "Skipping unreadable entry");
                    continue;
                }
            };

            let Some(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                self.visited.insert(entry.path().to_owned());
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            let Some(path) = Utf8Path::from_path(entry.path()) else {
                warn!(error = %ScanError::NonUtf8Path(entry.path().to_owned()), "Skipping entry");
                continue;
            };

            if !is_target_file(path, &self.extension) {
                continue;
            }

            if let Some(parent) = path.parent() {
                self.emit(parent);
            }
        }
    }

    /// Records `dir` as a target directory unless it was emitted already.
    fn emit(&mut self, dir: &Utf8Path) {
        if self.emitted.insert(dir.to_owned()) {
            let target = TargetDirectory::new(dir.to_owned());
            debug!(dir = %target.path(), label = target.label(), "Found target directory");
            self.found.push(target);
        }
    }
}

/// Convenience wrapper around [`Discovery`].
#[must_use]
pub fn discover<P: AsRef<Utf8Path>>(roots: &[P], config: &ScanConfig) -> Vec<TargetDirectory> {
    Discovery::new(config).discover(roots)
}

/// Checks a file's extension against the target extension, ignoring case.
pub(crate) fn is_target_file(path: &Utf8Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

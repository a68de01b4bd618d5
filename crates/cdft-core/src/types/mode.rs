//! Report output mode.

use serde::{Deserialize, Serialize};

/// How a run lays out its report files.
///
/// # Examples
///
/// ```
/// use cdft_core::OutputMode;
///
/// assert_eq!(OutputMode::from_collection_flag(true), OutputMode::Collection);
/// assert!(!OutputMode::default().is_collection());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One numbered report file per group label.
    #[default]
    PerGroup,

    /// One shared report file for every worker, rotated daily.
    Collection,
}

impl OutputMode {
    /// Maps the CLI collection flag to a mode.
    #[inline]
    #[must_use]
    pub const fn from_collection_flag(collection: bool) -> Self {
        if collection {
            Self::Collection
        } else {
            Self::PerGroup
        }
    }

    /// Returns `true` for [`OutputMode::Collection`].
    #[inline]
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::Collection)
    }

    /// Returns a short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PerGroup => "per-group",
            Self::Collection => "collection",
        }
    }
}

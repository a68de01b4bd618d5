//! The probing library seam.
//!
//! The external data-format library is reached through two calls, open by
//! path and close by handle. [`ProbeLibrary`] models exactly that, so the
//! probe unit can run against the bundled [`CdfHeaderLibrary`] or any other
//! binding.
//!
//! An implementation may also hang or bring the whole process down. Nothing
//! here tries to contain that: workers run in their own process and the
//! dispatcher treats an unexpected exit as the fault signal.

use std::fs::File;
use std::io::{self, Read};

use camino::Utf8Path;

use crate::error::ProbeError;

/// Magic numbers accepted in the first word of a CDF file (big-endian).
///
/// `0xCDF30001` marks version 3, `0xCDF26002` versions 2.6 and 2.7, and
/// `0x0000FFFF` the pre-2.6 layout.
pub const CDF_MAGIC_NUMBERS: [u32; 3] = [0xCDF3_0001, 0xCDF2_6002, 0x0000_FFFF];

/// Open/close access to a data-format library.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use cdft_scanner::{ProbeError, ProbeLibrary};
///
/// struct AlwaysOk;
///
/// impl ProbeLibrary for AlwaysOk {
///     type Handle = ();
///
///     fn open(&self, _path: &Utf8Path) -> Result<(), ProbeError> {
///         Ok(())
///     }
///
///     fn close(&self, _handle: ()) -> Result<(), ProbeError> {
///         Ok(())
///     }
/// }
/// ```
pub trait ProbeLibrary: Send + Sync {
    /// Handle returned by a successful open.
    type Handle;

    /// Opens the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] describing why the file could not be opened.
    fn open(&self, path: &Utf8Path) -> Result<Self::Handle, ProbeError>;

    /// Closes a handle returned by [`open`](Self::open).
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] describing why the handle could not be closed.
    fn close(&self, handle: Self::Handle) -> Result<(), ProbeError>;
}

/// Bundled library that performs the open-time check of a CDF reader.
///
/// Opening reads the leading magic word and rejects files that do not start
/// with one of [`CDF_MAGIC_NUMBERS`]. Closing releases the file handle. The
/// file is only ever opened for reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct CdfHeaderLibrary;

impl ProbeLibrary for CdfHeaderLibrary {
    type Handle = File;

    fn open(&self, path: &Utf8Path) -> Result<File, ProbeError> {
        let mut file = File::open(path)
            .map_err(|e| ProbeError::new(format!("unable to open file: {e}")))?;

        let mut magic = [0_u8; 4];
        file.read_exact(&mut magic).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ProbeError::new("file is too short to be a CDF"),
            _ => ProbeError::new(format!("unable to read file header: {e}")),
        })?;

        let word = u32::from_be_bytes(magic);
        if !CDF_MAGIC_NUMBERS.contains(&word) {
            return Err(ProbeError::new(format!(
                "not a CDF file (magic number {word:#010X})"
            )));
        }

        Ok(file)
    }

    fn close(&self, handle: File) -> Result<(), ProbeError> {
        drop(handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_accepts_v3_header() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "v3.cdf", &[0xCD, 0xF3, 0x00, 0x01, 0xCC, 0xCC]);

        let handle = CdfHeaderLibrary.open(&path).unwrap();
        assert!(CdfHeaderLibrary.close(handle).is_ok());
    }

    #[test]
    fn test_accepts_v26_header() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "v26.cdf", &[0xCD, 0xF2, 0x60, 0x02]);
        assert!(CdfHeaderLibrary.open(&path).is_ok());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.cdf", b"HDF5");

        let err = CdfHeaderLibrary.open(&path).unwrap_err();
        assert!(err.message().contains("not a CDF file"));
    }

    #[test]
    fn test_rejects_short_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "short.cdf", &[0xCD]);

        let err = CdfHeaderLibrary.open(&path).unwrap_err();
        assert_eq!(err.message(), "file is too short to be a CDF");
    }

    #[test]
    fn test_missing_file() {
        let err = CdfHeaderLibrary
            .open(Utf8Path::new("/nonexistent/missing.cdf"))
            .unwrap_err();
        assert!(err.message().starts_with("unable to open file"));
    }
}

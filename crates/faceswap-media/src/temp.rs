//! Scratch files for images on their way through the face replacer.
//!
//! The external tool picks its codec from the file extension, so every path
//! handed out here ends in the extension the caller asked for.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{MediaError, Result};

const PREFIX: &str = "faceswap-";

/// A scratch file owned by whoever asked for it.
///
/// Call [`TempFileHandle::release`] on every exit path; `Drop` releases as a
/// backstop so an early `?` never leaks disk.
#[derive(Debug)]
pub struct TempFileHandle {
    path: PathBuf,
    extension: String,
    released: bool,
}

impl TempFileHandle {
    fn new(path: PathBuf, extension: &str) -> Self {
        Self {
            path,
            extension: extension.to_string(),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extension without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Delete the file. Idempotent; a file that is already gone is not an error.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "released temp file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove temp file"),
        }
    }
}

impl Drop for TempFileHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Creates uniquely named files in one scratch directory.
#[derive(Debug, Clone)]
pub struct TempFileStore {
    dir: PathBuf,
}

impl TempFileStore {
    /// Store rooted at `dir`, or the OS temp dir when `None`.
    pub fn new(dir: Option<&str>) -> Self {
        let dir = dir
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a new file whose name ends in `.extension`.
    pub fn save(&self, bytes: &[u8], extension: &str) -> Result<TempFileHandle> {
        use std::io::Write;

        let extension = normalize(extension);
        let mut file = self.builder(&extension)?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| MediaError::Persist(format!("write {}: {e}", file.path().display())))?;

        // Keep the file on disk; the handle owns deletion from here on.
        let (_, path) = file
            .keep()
            .map_err(|e| MediaError::Persist(format!("keep temp file: {e}")))?;

        debug!(path = %path.display(), bytes = bytes.len(), "saved temp file");
        Ok(TempFileHandle::new(path, &extension))
    }

    /// Reserve a unique path ending in `.extension` without leaving a file
    /// behind, for a subprocess to write into.
    pub fn reserve(&self, extension: &str) -> Result<TempFileHandle> {
        let extension = normalize(extension);
        let path = self.builder(&extension)?.into_temp_path();
        let path = path
            .keep()
            .map_err(|e| MediaError::Persist(format!("keep temp path: {e}")))?;
        // The name is ours; the tool creates the file itself.
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "could not clear reserved path");
        }
        Ok(TempFileHandle::new(path, &extension))
    }

    fn builder(&self, extension: &str) -> Result<tempfile::NamedTempFile> {
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };
        tempfile::Builder::new()
            .prefix(PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.dir)
            .map_err(|e| MediaError::Persist(format!("create temp file in {}: {e}", self.dir.display())))
    }
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, TempFileStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TempFileStore::new(dir.path().to_str());
        (dir, store)
    }

    #[test]
    fn save_keeps_extension_and_bytes() {
        let (_dir, store) = store();
        let mut handle = store.save(b"PNGDATA", "PNG").unwrap();

        assert_eq!(handle.extension(), "png");
        assert!(handle.path().to_string_lossy().ends_with(".png"));
        assert!(handle
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(PREFIX));
        assert_eq!(std::fs::read(handle.path()).unwrap(), b"PNGDATA");
        handle.release();
    }

    #[test]
    fn release_removes_file_and_is_idempotent() {
        let (_dir, store) = store();
        let mut handle = store.save(b"x", "jpg").unwrap();
        let path = handle.path().to_path_buf();

        handle.release();
        assert!(!path.exists());
        handle.release();
        assert!(!path.exists());
    }

    #[test]
    fn release_tolerates_externally_removed_file() {
        let (_dir, store) = store();
        let mut handle = store.save(b"x", "jpg").unwrap();
        std::fs::remove_file(handle.path()).unwrap();
        handle.release();
    }

    #[test]
    fn drop_releases() {
        let (_dir, store) = store();
        let path = {
            let handle = store.save(b"x", "gif").unwrap();
            handle.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn saves_get_distinct_paths() {
        let (_dir, store) = store();
        let a = store.save(b"a", "png").unwrap();
        let b = store.save(b"a", "png").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn reserve_hands_out_an_empty_slot() {
        let (_dir, store) = store();
        let handle = store.reserve(".png").unwrap();
        assert!(handle.path().to_string_lossy().ends_with(".png"));
        assert!(!handle.path().exists());
    }

    #[test]
    fn missing_scratch_dir_is_a_persist_error() {
        let store = TempFileStore::new(Some("/no/such/scratch/dir"));
        let err = store.save(b"x", "png").unwrap_err();
        assert!(matches!(err, MediaError::Persist(_)));
    }
}

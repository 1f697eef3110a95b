//! Common filesystem utilities
//!
//! Every helper here tolerates being re-run over the results of an earlier,
//! partially failed run: existing directories are fine, existing files are
//! overwritten, and removing something already gone is not an error.

use crate::error::{ProvisionError, Result};
use std::io::ErrorKind;
use std::path::Path;

/// Create a directory and all ancestors. Succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ProvisionError::io(format!("cannot create directory {}", dir.display()), e))
}

/// Ensure a file's parent directory exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Remove a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProvisionError::io(
            format!("cannot remove {}", path.display()),
            e,
        )),
    }
}

/// Copy a file, creating parent directories as needed.
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64> {
    ensure_parent_dir(dest)?;
    std::fs::copy(src, dest).map_err(|e| {
        ProvisionError::io(
            format!("copy failed: {} -> {}", src.display(), dest.display()),
            e,
        )
    })
}

/// Move a file, creating parent directories as needed and replacing `dest`.
///
/// Falls back to copy + remove when a rename is not possible, e.g. across
/// filesystems.
pub fn move_file(src: &Path, dest: &Path) -> Result<()> {
    ensure_parent_dir(dest)?;
    if std::fs::rename(src, dest).is_ok() {
        return Ok(());
    }
    if !src.exists() {
        return Err(ProvisionError::MissingArtifact {
            path: src.to_path_buf(),
        });
    }
    copy_file(src, dest)?;
    remove_file_if_exists(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("a/b/c");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_remove_missing_file_is_ok() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("gone.csv.gz");
        remove_file_if_exists(&file).unwrap();

        std::fs::write(&file, b"x").unwrap();
        remove_file_if_exists(&file).unwrap();
        assert!(!file.exists());
        remove_file_if_exists(&file).unwrap();
    }

    #[test]
    fn test_move_file_creates_parent_and_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("310.csv");
        let dest = temp.path().join("data/ocid/310.csv");

        std::fs::write(&src, b"old").unwrap();
        move_file(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"old");

        std::fs::write(&src, b"new").unwrap();
        move_file(&src, &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_move_missing_source_names_it() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("missing.csv");
        let err = move_file(&src, &temp.path().join("out.csv")).unwrap_err();
        match err {
            ProvisionError::MissingArtifact { path } => assert_eq!(path, src),
            other => panic!("unexpected error: {other}"),
        }
    }
}

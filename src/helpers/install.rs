//! INSTALL stage helpers
//!
//! Places artifacts into the fixed layout consumers rely on:
//!
//! ```text
//! {root}/lib/<shared library, three names>
//! {root}/include/<mirrored header tree>
//! {root}/data/<subsystem>/<id>.csv
//! ```
//!
//! Installing is idempotent: a destination that already holds the same bytes
//! is left untouched and reported as [`InstallAction::Unchanged`].

use crate::core::output;
use crate::error::{ProvisionError, Result};
use crate::helpers::internal::{fs_utils, hash};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MANIFEST_DIR: &str = ".nativedeps";

/// Directory layout under an installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    pub fn include_dir(&self) -> PathBuf {
        self.root.join("include")
    }

    pub fn data_dir(&self, subsystem: &str) -> PathBuf {
        self.root.join("data").join(subsystem)
    }

    pub fn manifest_path(&self, dependency: &str) -> PathBuf {
        self.root
            .join(MANIFEST_DIR)
            .join(format!("{}.json", dependency))
    }

    /// Create `lib/`, `include/` and `data/<subsystem>/` for each subsystem.
    /// Existing directories are fine.
    pub fn ensure(&self, subsystems: &[&str]) -> Result<()> {
        fs_utils::ensure_dir(&self.lib_dir())?;
        fs_utils::ensure_dir(&self.include_dir())?;
        for subsystem in subsystems {
            fs_utils::ensure_dir(&self.data_dir(subsystem))?;
        }
        Ok(())
    }
}

/// What happened to one installed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallAction {
    Copied,
    Unchanged,
    Moved,
    Extracted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledFile {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub action: InstallAction,
}

/// Record of one successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledManifest {
    pub dependency: String,
    pub version: String,
    pub files: Vec<InstalledFile>,
}

impl InstalledManifest {
    pub fn new(dependency: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            dependency: dependency.into(),
            version: version.into(),
            files: Vec::new(),
        }
    }

    pub fn count(&self, action: InstallAction) -> usize {
        self.files.iter().filter(|f| f.action == action).count()
    }
}

/// Copy `src` to `dest` unless `dest` already has identical contents.
pub fn install_file(src: &Path, dest: &Path) -> Result<InstalledFile> {
    if !src.is_file() {
        return Err(ProvisionError::MissingArtifact {
            path: src.to_path_buf(),
        });
    }

    let action = if hash::same_contents(src, dest)? {
        InstallAction::Unchanged
    } else {
        output::detail(&format!("install {} -> {}", src.display(), dest.display()));
        fs_utils::copy_file(src, dest)?;
        InstallAction::Copied
    };

    Ok(InstalledFile {
        path: dest.to_path_buf(),
        sha256: Some(hash::sha256_file(dest)?),
        action,
    })
}

/// Install a shared library under each of its names.
///
/// `names[0]` is the concrete, fully versioned file and must exist in
/// `build_dir`. Every name receives a real copy of its bytes; no symlinks are
/// created, so the layout survives filesystems and archives without them.
pub fn install_libraries(
    build_dir: &Path,
    names: &[String],
    lib_dir: &Path,
) -> Result<Vec<InstalledFile>> {
    let concrete_name = names.first().ok_or_else(|| {
        ProvisionError::InvalidRequest("no library names to install".to_string())
    })?;
    let concrete = build_dir.join(concrete_name);
    if !concrete.is_file() {
        return Err(ProvisionError::MissingArtifact { path: concrete });
    }

    names
        .iter()
        .map(|name| install_file(&concrete, &lib_dir.join(name)))
        .collect()
}

/// Mirror a header tree file by file, creating directories as they are met.
pub fn install_headers(src_include: &Path, include_dir: &Path) -> Result<Vec<InstalledFile>> {
    if !src_include.is_dir() {
        return Err(ProvisionError::MissingArtifact {
            path: src_include.to_path_buf(),
        });
    }

    let mut installed = Vec::new();
    for entry in WalkDir::new(src_include).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            ProvisionError::io(
                format!("cannot walk {}", src_include.display()),
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            )
        })?;
        let rel = entry
            .path()
            .strip_prefix(src_include)
            .map_err(|_| ProvisionError::MissingArtifact {
                path: entry.path().to_path_buf(),
            })?;
        let dest = include_dir.join(rel);

        if entry.file_type().is_dir() {
            fs_utils::ensure_dir(&dest)?;
        } else {
            installed.push(install_file(entry.path(), &dest)?);
        }
    }

    Ok(installed)
}

/// Move a decompressed data file to `data_dir/<id>.csv`.
pub fn place_data(src: &Path, data_dir: &Path, id: &str) -> Result<InstalledFile> {
    let dest = data_dir.join(format!("{}.csv", id));
    fs_utils::move_file(src, &dest)?;
    output::detail(&format!("moved {} -> {}", src.display(), dest.display()));

    Ok(InstalledFile {
        sha256: Some(hash::sha256_file(&dest)?),
        path: dest,
        action: InstallAction::Moved,
    })
}

/// Write a manifest to `{root}/.nativedeps/<dependency>.json`.
pub fn write_manifest(layout: &InstallLayout, manifest: &InstalledManifest) -> Result<PathBuf> {
    let path = layout.manifest_path(&manifest.dependency);
    fs_utils::ensure_parent_dir(&path)?;
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| ProvisionError::io("cannot serialize manifest", e.into()))?;
    std::fs::write(&path, json)
        .map_err(|e| ProvisionError::io(format!("cannot write {}", path.display()), e))?;
    Ok(path)
}

/// Read a manifest written by an earlier run, if there is one.
pub fn read_manifest(layout: &InstallLayout, dependency: &str) -> Result<Option<InstalledManifest>> {
    let path = layout.manifest_path(dependency);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ProvisionError::io(
                format!("cannot read {}", path.display()),
                e,
            ));
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ProvisionError::io(format!("invalid manifest {}", path.display()), e.into()))
}

//! ACQUIRE stage - getting sources and payloads
//!
//! - **git**: clone-if-absent checkouts, explicit update mode
//! - **download**: HTTP GET into a scratch file under the installation root
//! - **verify**: format sanity checks before anything is decompressed

pub mod download;
pub mod git;
pub mod verify;

use crate::error::Result;
use crate::helpers::internal::fs_utils;
use crate::resolve::PayloadKind;
use std::path::{Path, PathBuf};

pub use download::{download, fetch};
pub use git::{AcquireMode, acquire_checkout};
pub use verify::{GZIP_MAGIC, validate};

/// A checkout or downloaded file held inside the installation root for the
/// duration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingPayload {
    pub path: PathBuf,
    pub kind: PayloadKind,
}

impl WorkingPayload {
    pub fn new(path: impl AsRef<Path>, kind: PayloadKind) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind,
        }
    }

    /// Delete a downloaded payload after its contents were relocated.
    ///
    /// Checkouts are kept for later rebuilds. Deleting an already removed
    /// file succeeds.
    pub fn discard(&self) -> Result<()> {
        match self.kind {
            PayloadKind::Checkout => Ok(()),
            PayloadKind::Zip | PayloadKind::Gzip => fs_utils::remove_file_if_exists(&self.path),
        }
    }
}

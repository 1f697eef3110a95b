//! File digests
//!
//! SHA-256 is used to recognise installs that are already up to date and to
//! record what was installed. It is not a signature check.

use crate::error::{ProvisionError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| ProvisionError::io(format!("cannot open {}", path.display()), e))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buffer)
            .map_err(|e| ProvisionError::io(format!("read error on {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// True when `dest` exists and has exactly the bytes of `src`.
pub fn same_contents(src: &Path, dest: &Path) -> Result<bool> {
    let (Ok(src_meta), Ok(dest_meta)) = (std::fs::metadata(src), std::fs::metadata(dest)) else {
        return Ok(false);
    };
    if !dest_meta.is_file() || src_meta.len() != dest_meta.len() {
        return Ok(false);
    }
    Ok(sha256_file(src)? == sha256_file(dest)?)
}

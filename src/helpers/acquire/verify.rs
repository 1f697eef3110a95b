//! Payload sanity checks
//!
//! Download endpoints sometimes answer with a 200 and an HTML error page.
//! Checking the container magic before decompressing turns that into a
//! named [`ProvisionError::Validation`] carrying the start of the content,
//! instead of a confusing decoder failure later on.

use crate::core::output;
use crate::error::{ProvisionError, Result};
use crate::resolve::PayloadKind;
use std::io::Read;
use std::path::Path;

/// Leading bytes of every gzip member (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// How much of a rejected payload is kept in the error.
pub const EXCERPT_LEN: usize = 100;

/// Validate the payload at `path`.
///
/// Zip containers are checked by the extractor itself and always pass here.
pub fn validate(path: &Path, kind: PayloadKind) -> Result<()> {
    match kind {
        PayloadKind::Checkout | PayloadKind::Zip => Ok(()),
        PayloadKind::Gzip => {
            let file = std::fs::File::open(path)
                .map_err(|e| ProvisionError::io(format!("cannot open {}", path.display()), e))?;
            validate_reader(file, path, kind)?;
            output::detail(&format!("{} is gzip data", path.display()));
            Ok(())
        }
    }
}

/// Validate a byte stream; `path` only labels the error.
pub fn validate_reader<R: Read>(reader: R, path: &Path, kind: PayloadKind) -> Result<()> {
    if kind != PayloadKind::Gzip {
        return Ok(());
    }

    let mut head = Vec::with_capacity(EXCERPT_LEN);
    reader
        .take(EXCERPT_LEN as u64)
        .read_to_end(&mut head)
        .map_err(|e| ProvisionError::io(format!("cannot read {}", path.display()), e))?;

    if head.starts_with(&GZIP_MAGIC) {
        Ok(())
    } else {
        Err(ProvisionError::Validation {
            path: path.to_path_buf(),
            head,
        })
    }
}

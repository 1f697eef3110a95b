//! HTTP downloads into the installation root
//!
//! The response body is streamed to `<dest>.part` and renamed into place
//! once complete, so a file at `dest` is always a whole response.
//! URLs can carry secrets (the OpenCellID token), so only the descriptor's
//! `display_url` ever reaches output or errors.

use super::WorkingPayload;
use crate::core::config::HttpSettings;
use crate::core::output::{self, ProgressGuard};
use crate::error::{ProvisionError, Result};
use crate::helpers::internal::fs_utils;
use crate::resolve::VariantDescriptor;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const BUFFER_SIZE: usize = 64 * 1024;

/// Describe a ureq failure without echoing the request URL.
fn describe_error(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, response) => {
            format!("HTTP {} {}", code, response.status_text())
        }
        ureq::Error::Transport(transport) => match transport.message() {
            Some(message) => format!("{}: {}", transport.kind(), message),
            None => transport.kind().to_string(),
        },
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// GET `url` into `dest`. Returns the number of bytes written.
///
/// `display_url` is what appears in progress lines and in the error.
pub fn download(agent: &ureq::Agent, url: &str, display_url: &str, dest: &Path) -> Result<u64> {
    fs_utils::ensure_parent_dir(dest)?;

    let filename = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    output::detail(&format!("GET {}", display_url));

    let fetch_error = |reason: String| ProvisionError::Fetch {
        url: display_url.to_string(),
        reason,
    };

    let guard = ProgressGuard::new(output::spinner(&format!("downloading {}", filename)));
    let response = agent.get(url).call().map_err(|e| fetch_error(describe_error(e)))?;

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        output::upgrade_to_bytes(guard.bar(), len);
    }

    let part = part_path(dest);
    let mut file = std::fs::File::create(&part)
        .map_err(|e| ProvisionError::io(format!("cannot create {}", part.display()), e))?;

    let mut reader = response.into_reader();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total_bytes = 0u64;
    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| fetch_error(format!("read error: {}", e)))?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])
            .map_err(|e| ProvisionError::io(format!("write error on {}", part.display()), e))?;
        total_bytes += n as u64;
        guard.bar().set_position(total_bytes);
    }
    file.flush()
        .map_err(|e| ProvisionError::io(format!("write error on {}", part.display()), e))?;
    drop(file);

    std::fs::rename(&part, dest).map_err(|e| {
        ProvisionError::io(
            format!("cannot move {} to {}", part.display(), dest.display()),
            e,
        )
    })?;

    drop(guard);
    output::detail(&format!("downloaded {} ({} bytes)", filename, total_bytes));
    Ok(total_bytes)
}

/// Download a descriptor's payload to `dest`.
pub fn fetch(
    http: &HttpSettings,
    descriptor: &VariantDescriptor,
    dest: &Path,
) -> Result<WorkingPayload> {
    let agent = http.agent();
    download(&agent, &descriptor.url_or_repo, &descriptor.display_url, dest)?;
    Ok(WorkingPayload::new(dest, descriptor.payload))
}

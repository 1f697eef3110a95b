//! Archive extraction
//!
//! Native Rust decoders only, no external tools needed. Extraction overwrites
//! whatever an earlier run left in the destination.

use crate::core::output::{self, ProgressGuard};
use crate::error::{ProvisionError, Result};
use crate::helpers::internal::fs_utils;
use crate::resolve::PayloadKind;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn extract_error(path: &Path, reason: impl Into<String>) -> ProvisionError {
    ProvisionError::Extract {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Extract every entry of a zip archive into `dest`.
fn extract_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .map_err(|e| ProvisionError::io(format!("cannot open {}", archive_path.display()), e))?;

    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| extract_error(archive_path, format!("zip read error: {}", e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| extract_error(archive_path, format!("zip entry error: {}", e)))?;

        // Entries whose names would escape `dest` are skipped.
        let outpath = match entry.enclosed_name() {
            Some(path) => dest.join(path),
            None => {
                output::warning(&format!("skipping unsafe zip entry: {}", entry.name()));
                continue;
            }
        };

        if entry.is_dir() {
            fs_utils::ensure_dir(&outpath)?;
            continue;
        }

        fs_utils::ensure_parent_dir(&outpath)?;
        let mut outfile = File::create(&outpath)
            .map_err(|e| ProvisionError::io(format!("cannot create {}", outpath.display()), e))?;
        std::io::copy(&mut entry, &mut outfile)
            .map_err(|e| extract_error(archive_path, format!("{}: {}", outpath.display(), e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                if let Err(e) =
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))
                {
                    output::warning(&format!(
                        "cannot set mode {:o} on {}: {}",
                        mode,
                        outpath.display(),
                        e
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Output file name for a gzip payload: the source name without `.gz`.
pub fn gunzip_target(archive_path: &Path) -> Result<String> {
    let name = archive_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.strip_suffix(".gz") {
        Some(stem) if !stem.is_empty() => Ok(stem.to_string()),
        _ => Err(extract_error(
            archive_path,
            "gzip payload name must end in .gz",
        )),
    }
}

/// Decompress a single gzip stream into `dest/<name without .gz>`.
fn extract_gzip(archive_path: &Path, dest: &Path) -> Result<PathBuf> {
    let target = dest.join(gunzip_target(archive_path)?);

    let file = File::open(archive_path)
        .map_err(|e| ProvisionError::io(format!("cannot open {}", archive_path.display()), e))?;
    let mut decoder = flate2::read::GzDecoder::new(BufReader::new(file));

    let out = File::create(&target)
        .map_err(|e| ProvisionError::io(format!("cannot create {}", target.display()), e))?;
    let mut writer = BufWriter::new(out);
    std::io::copy(&mut decoder, &mut writer)
        .map_err(|e| extract_error(archive_path, format!("gzip decode error: {}", e)))?;
    writer
        .flush()
        .map_err(|e| ProvisionError::io(format!("write error on {}", target.display()), e))?;

    Ok(target)
}

fn extract_zip_into(archive: &Path, dest: &Path) -> Result<PathBuf> {
    extract_zip(archive, dest)?;
    Ok(dest.to_path_buf())
}

/// Extract `archive` into `dest`, decoding it as `kind`.
///
/// Zip covers wheels too. Returns `dest` for zip archives and the
/// decompressed file for gzip. A checkout is not an archive.
pub fn extract(archive: &Path, dest: &Path, kind: PayloadKind) -> Result<PathBuf> {
    let decode: fn(&Path, &Path) -> Result<PathBuf> = match kind {
        PayloadKind::Zip => extract_zip_into,
        PayloadKind::Gzip => extract_gzip,
        PayloadKind::Checkout => {
            return Err(extract_error(archive, "a checkout is not an archive"));
        }
    };
    fs_utils::ensure_dir(dest)?;

    let filename = archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());
    let guard = ProgressGuard::new(output::spinner(&format!("extracting {}", filename)));

    let result = decode(archive, dest);

    drop(guard);
    let extracted = result?;
    output::detail(&format!("extracted {} to {}", filename, extracted.display()));
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn write_gzip(path: &Path, content: &[u8]) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_checkout_is_not_extractable() {
        let temp = tempfile::tempdir().unwrap();
        let err = extract(temp.path(), temp.path(), PayloadKind::Checkout).unwrap_err();
        assert!(matches!(err, ProvisionError::Extract { .. }));
    }

    #[test]
    fn test_gunzip_target() {
        assert_eq!(gunzip_target(Path::new("/r/310.csv.gz")).unwrap(), "310.csv");
        assert!(gunzip_target(Path::new("/r/310.csv")).is_err());
        assert!(gunzip_target(Path::new("/r/.gz")).is_err());
    }

    #[test]
    fn test_extract_gzip_overwrites_previous_output() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("311.csv.gz");
        std::fs::write(temp.path().join("311.csv"), b"stale content from an earlier run").unwrap();
        write_gzip(&archive, b"radio,mcc,net\nGSM,311,480\n");

        let out = extract(&archive, temp.path(), PayloadKind::Gzip).unwrap();
        assert_eq!(out, temp.path().join("311.csv"));
        assert_eq!(std::fs::read(&out).unwrap(), b"radio,mcc,net\nGSM,311,480\n");
    }

    #[test]
    fn test_extract_gzip_corrupt_stream() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("312.csv.gz");
        std::fs::write(&archive, [0x1f, 0x8b, 0x00, 0x01, 0x02]).unwrap();

        let err = extract(&archive, temp.path(), PayloadKind::Gzip).unwrap_err();
        assert!(matches!(err, ProvisionError::Extract { .. }));
    }

    #[test]
    fn test_extract_zip_with_nested_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = temp.path().join("libtorch.zip");
        let extract_dir = temp.path().join("root");

        let file = File::create(&archive_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.add_directory("libtorch/include/torch/", options).unwrap();
        zip.start_file("libtorch/include/torch/torch.h", options).unwrap();
        zip.write_all(b"#pragma once").unwrap();
        zip.start_file("libtorch/lib/libtorch.so", options).unwrap();
        zip.write_all(b"\x7fELF").unwrap();
        zip.finish().unwrap();

        // A previous run left an older copy behind.
        std::fs::create_dir_all(extract_dir.join("libtorch/lib")).unwrap();
        std::fs::write(extract_dir.join("libtorch/lib/libtorch.so"), b"old").unwrap();

        let out = extract(&archive_path, &extract_dir, PayloadKind::Zip).unwrap();
        assert_eq!(out, extract_dir);
        assert_eq!(
            std::fs::read_to_string(extract_dir.join("libtorch/include/torch/torch.h")).unwrap(),
            "#pragma once"
        );
        assert_eq!(
            std::fs::read(extract_dir.join("libtorch/lib/libtorch.so")).unwrap(),
            b"\x7fELF"
        );
    }

    #[test]
    fn test_extract_zip_rejects_non_zip() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("libtorch.zip");
        std::fs::write(&archive, b"<html>Access denied</html>").unwrap();

        let err = extract(&archive, &temp.path().join("out"), PayloadKind::Zip).unwrap_err();
        assert!(matches!(err, ProvisionError::Extract { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_zip_keeps_unix_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let archive_path = temp.path().join("torch.whl");
        let extract_dir = temp.path().join("root");

        let file = File::create(&archive_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let executable = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        zip.start_file("torch/bin/torch_shm_manager", executable).unwrap();
        zip.write_all(b"\x7fELF").unwrap();
        zip.finish().unwrap();

        extract(&archive_path, &extract_dir, PayloadKind::Zip).unwrap();
        let mode = std::fs::metadata(extract_dir.join("torch/bin/torch_shm_manager"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

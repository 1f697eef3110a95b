//! Common test utilities: a fake git/cmake toolchain and payload builders.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use nativedeps::{
    Arch, ExitStatus, HttpSettings, Os, ProcessRunner, ProcessSpec, RunConfig, TargetEnvironment,
};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LIBRARY_BYTES: &[u8] = b"\x7fELF fake libcassandra";

/// Records every command and imitates what git and cmake leave on disk.
///
/// - `git clone <repo> <dest>` creates `<dest>/.git` and a small header tree
/// - `git rev-parse` / `git pull` succeed
/// - `cmake --build <dir> ...` writes each of `produced` into `<dir>`
pub struct FakeToolchain {
    pub calls: RefCell<Vec<ProcessSpec>>,
    pub produced: Vec<String>,
    pub cmake_exit: i32,
}

impl FakeToolchain {
    pub fn producing(files: &[&str]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            produced: files.iter().map(|f| f.to_string()).collect(),
            cmake_exit: 0,
        }
    }

    pub fn failing_cmake(code: i32) -> Self {
        Self {
            cmake_exit: code,
            ..Self::producing(&[])
        }
    }

    /// Number of recorded invocations whose arguments contain `verb`.
    pub fn count(&self, verb: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|spec| spec.args_lossy().iter().any(|a| a == verb))
            .count()
    }

    pub fn programs(&self) -> Vec<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .map(|spec| spec.program().to_path_buf())
            .collect()
    }
}

impl ProcessRunner for FakeToolchain {
    fn run(&self, spec: &ProcessSpec) -> std::io::Result<ExitStatus> {
        self.calls.borrow_mut().push(spec.clone());
        let args = spec.args_lossy();
        let program = spec
            .program()
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match program.as_str() {
            "git" => {
                if args.first().map(String::as_str) == Some("clone") {
                    let dest = Path::new(&args[2]);
                    std::fs::create_dir_all(dest.join(".git"))?;
                    std::fs::create_dir_all(dest.join("include/dse"))?;
                    std::fs::write(dest.join("include/cassandra.h"), b"/* cassandra.h */")?;
                    std::fs::write(dest.join("include/dse/dse.h"), b"/* dse.h */")?;
                }
                Ok(ExitStatus::from_code(0))
            }
            "cmake" => {
                if self.cmake_exit != 0 {
                    return Ok(ExitStatus::from_code(self.cmake_exit));
                }
                if args.first().map(String::as_str) == Some("--build") {
                    let build_dir = Path::new(&args[1]);
                    for name in &self.produced {
                        std::fs::write(build_dir.join(name), LIBRARY_BYTES)?;
                    }
                }
                Ok(ExitStatus::from_code(0))
            }
            other => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unexpected program {}", other),
            )),
        }
    }
}

pub fn config(root: &Path, os: Os, arch: Arch) -> RunConfig {
    RunConfig::new(
        root,
        TargetEnvironment::new(os, arch),
        HttpSettings::new("Mozilla/5.0 nativedeps-tests", Some(30)),
    )
}

pub fn gzip(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    encoder.finish().unwrap()
}

/// Build an in-memory zip from `(name, content)` pairs.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

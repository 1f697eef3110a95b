//! BUILD stage helpers
//!
//! Source builds go through cmake in two steps: configure into
//! `<checkout>/build`, then compile the Debug configuration's `all` target.
//! Configure runs every time; cmake itself decides what is stale.

pub mod extract;

use crate::core::output;
use crate::core::platform::PlatformProfile;
use crate::error::{ProvisionError, Result};
use crate::helpers::internal::cmd::{ProcessRunner, ProcessSpec};
use crate::helpers::internal::fs_utils;
use std::path::{Path, PathBuf};

pub use extract::extract;

/// Name of the out-of-source build directory inside a checkout.
pub const BUILD_DIR_NAME: &str = "build";

/// The configure command for `checkout`.
pub fn configure_command(
    profile: &PlatformProfile,
    checkout: &Path,
    build_dir: &Path,
    toolchain_flags: &[String],
) -> ProcessSpec {
    ProcessSpec::new(profile.cmake_program())
        .args(toolchain_flags)
        .arg("-S")
        .arg(checkout)
        .arg("-B")
        .arg(build_dir)
        .current_dir(checkout)
}

/// The compile command for an already configured `build_dir`.
pub fn compile_command(profile: &PlatformProfile, build_dir: &Path) -> ProcessSpec {
    ProcessSpec::new(profile.cmake_program())
        .arg("--build")
        .arg(build_dir)
        .args(["--config", "Debug", "--target", "all"])
        .current_dir(build_dir)
}

fn run_step<R: ProcessRunner + ?Sized>(runner: &R, spec: &ProcessSpec) -> Result<()> {
    output::detail(&spec.to_string());
    let status = runner.run(spec).map_err(|e| ProvisionError::Build {
        command: spec.to_string(),
        code: None,
        reason: format!("cannot start {}: {}", spec.program().display(), e),
    })?;
    if !status.success() {
        let reason = match status.code() {
            Some(code) => format!("exited with code {}", code),
            None => "terminated by a signal".to_string(),
        };
        return Err(ProvisionError::Build {
            command: spec.to_string(),
            code: status.code(),
            reason,
        });
    }
    Ok(())
}

/// Configure and compile a checkout. Returns the build output directory.
pub fn build<R: ProcessRunner + ?Sized>(
    runner: &R,
    checkout: &Path,
    profile: &PlatformProfile,
    toolchain_flags: &[String],
) -> Result<PathBuf> {
    let build_dir = checkout.join(BUILD_DIR_NAME);
    fs_utils::ensure_dir(&build_dir)?;

    run_step(
        runner,
        &configure_command(profile, checkout, &build_dir, toolchain_flags),
    )?;
    run_step(runner, &compile_command(profile, &build_dir))?;

    output::detail(&format!("build output in {}", build_dir.display()));
    Ok(build_dir)
}

//! DataStax C/C++ driver, built from source
//!
//! Clones `cpp-driver` into the installation root (once), configures and
//! compiles it with cmake, then installs the shared library under its three
//! conventional names plus the public header tree.

use super::scratch_path;
use crate::core::config::RunConfig;
use crate::core::output;
use crate::core::platform::PlatformProfile;
use crate::error::Result;
use crate::helpers::acquire::{AcquireMode, acquire_checkout};
use crate::helpers::build;
use crate::helpers::install::{self, InstallAction, InstallLayout, InstalledManifest};
use crate::helpers::internal::cmd::ProcessRunner;
use crate::resolve::{self, CASSANDRA_SOVERSION, Dependency};

/// File stem of the driver's shared library (`libcassandra.*`).
pub const LIBRARY_STEM: &str = "cassandra";

/// Provision the driver at `version` into `config.root()`.
///
/// `runner` executes git and cmake. Running twice with the same version
/// re-configures and re-compiles but clones nothing and reports every
/// installed file as unchanged.
pub fn provision<R: ProcessRunner + ?Sized>(
    config: &RunConfig,
    runner: &R,
    version: &str,
    mode: AcquireMode,
) -> Result<InstalledManifest> {
    let descriptor = resolve::resolve_cassandra(config.env(), version)?;
    let profile = PlatformProfile::for_env(config.env(), Dependency::Cassandra.name())?;

    output::action(&format!(
        "Provisioning cassandra cpp-driver {} for {}",
        descriptor.version_tag,
        config.env()
    ));

    output::sub_action("acquire");
    let checkout = acquire_checkout(
        runner,
        &descriptor.url_or_repo,
        &scratch_path(config, &descriptor),
        mode,
    )?;

    output::sub_action("build");
    let build_dir = build::build(
        runner,
        &checkout.path,
        &profile,
        &descriptor.toolchain_flags,
    )?;

    output::sub_action("install");
    let layout = InstallLayout::new(config.root());
    layout.ensure(&[])?;

    let names =
        profile.shared_library_names(LIBRARY_STEM, &descriptor.version_tag, CASSANDRA_SOVERSION);
    let mut manifest =
        InstalledManifest::new(Dependency::Cassandra.name(), descriptor.version_tag.as_str());
    manifest
        .files
        .extend(install::install_libraries(&build_dir, &names, &layout.lib_dir())?);
    manifest.files.extend(install::install_headers(
        &checkout.path.join("include"),
        &layout.include_dir(),
    )?);

    let manifest_path = install::write_manifest(&layout, &manifest)?;
    output::detail(&format!("manifest written to {}", manifest_path.display()));

    let unchanged = manifest.count(InstallAction::Unchanged);
    if unchanged == manifest.files.len() {
        output::skip(&format!(
            "cassandra {} already installed, nothing changed",
            descriptor.version_tag
        ));
    } else {
        output::success(&format!(
            "cassandra {} installed ({} files, {} unchanged)",
            descriptor.version_tag,
            manifest.files.len(),
            unchanged
        ));
    }

    Ok(manifest)
}

//! Prebuilt LibTorch distribution
//!
//! Downloads the cxx11-ABI archive (or the aarch64 wheel) into the
//! installation root, unpacks it there and removes the archive.

use super::scratch_path;
use crate::core::config::RunConfig;
use crate::core::output;
use crate::error::{ProvisionError, Result};
use crate::helpers::acquire::{fetch, validate};
use crate::helpers::build::extract;
use crate::helpers::install::{
    self, InstallAction, InstallLayout, InstalledFile, InstalledManifest,
};
use crate::resolve::{self, Dependency, PYTORCH_BASE};

pub fn provision(config: &RunConfig, version: &str, accelerator: &str) -> Result<InstalledManifest> {
    provision_from(PYTORCH_BASE, config, version, accelerator)
}

/// Provision from a different download host.
pub fn provision_from(
    base: &str,
    config: &RunConfig,
    version: &str,
    accelerator: &str,
) -> Result<InstalledManifest> {
    let descriptor = resolve::resolve_libtorch_from(base, config.env(), version, accelerator)?;
    let accelerator = descriptor.accelerator_tag.as_deref().unwrap_or_default();

    output::action(&format!(
        "Provisioning libtorch {} ({}) for {}",
        descriptor.version_tag,
        accelerator,
        config.env()
    ));

    output::sub_action("acquire");
    let payload = fetch(config.http(), &descriptor, &scratch_path(config, &descriptor))?;
    validate(&payload.path, payload.kind)?;

    output::sub_action("extract");
    extract(&payload.path, config.root(), payload.kind)?;

    let unpacked = config
        .root()
        .join(descriptor.unpacked_dir.as_deref().unwrap_or("libtorch"));
    if !unpacked.is_dir() {
        return Err(ProvisionError::MissingArtifact { path: unpacked });
    }
    payload.discard()?;

    output::sub_action("install");
    let layout = InstallLayout::new(config.root());
    let mut manifest =
        InstalledManifest::new(Dependency::LibTorch.name(), descriptor.version_tag.as_str());
    manifest.files.push(InstalledFile {
        path: unpacked,
        sha256: None,
        action: InstallAction::Extracted,
    });
    install::write_manifest(&layout, &manifest)?;

    output::success(&format!(
        "libtorch {} ({}) extracted to {}",
        descriptor.version_tag,
        accelerator,
        manifest.files[0].path.display()
    ));
    Ok(manifest)
}

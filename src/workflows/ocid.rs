//! OpenCellID cell tower datasets
//!
//! One gzip CSV per mobile country code. Regions are processed in order and
//! independently: a region whose download fails or turns out not to be gzip
//! data (an expired token yields a 200 with an HTML page) is reported and
//! skipped, and the loop moves on to the next one.

use super::scratch_path;
use crate::core::config::RunConfig;
use crate::core::output;
use crate::error::{ProvisionError, Result};
use crate::helpers::acquire::{fetch, validate};
use crate::helpers::build::extract;
use crate::helpers::install::{self, InstallLayout, InstalledFile, InstalledManifest};
use crate::resolve::{self, Dependency, OCID_ENDPOINT, VariantDescriptor};

/// Data subsystem the CSV files are placed under (`data/ocid/`).
pub const SUBSYSTEM: &str = "ocid";

#[derive(Debug)]
pub struct RegionFailure {
    pub region: u32,
    pub error: ProvisionError,
}

/// Outcome of a dataset run.
#[derive(Debug, Default)]
pub struct DatasetReport {
    pub installed: Vec<InstalledFile>,
    pub failures: Vec<RegionFailure>,
}

impl DatasetReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_regions(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.region).collect()
    }
}

pub fn provision(config: &RunConfig, token: &str, regions: &[u32]) -> Result<DatasetReport> {
    provision_from(OCID_ENDPOINT, config, token, regions)
}

/// Provision against a different download endpoint.
///
/// Errors returned directly are request errors (empty token or region list)
/// and layout failures; per-region failures end up in the report.
pub fn provision_from(
    endpoint: &str,
    config: &RunConfig,
    token: &str,
    regions: &[u32],
) -> Result<DatasetReport> {
    let descriptors = resolve::resolve_ocid_from(endpoint, token, regions)?;
    let layout = InstallLayout::new(config.root());
    layout.ensure(&[SUBSYSTEM])?;

    output::action(&format!(
        "Provisioning OpenCellID data for {} region(s)",
        descriptors.len()
    ));

    let mut report = DatasetReport::default();
    let total = descriptors.len();
    for (i, descriptor) in descriptors.iter().enumerate() {
        let region = descriptor.region.unwrap_or_default();
        output::action_numbered(i + 1, total, &format!("region {}", region));

        match fetch_region(config, &layout, descriptor) {
            Ok(file) => report.installed.push(file),
            Err(error) => {
                output::error(&format!("region {} skipped: {}", region, error));
                report.failures.push(RegionFailure { region, error });
            }
        }
    }

    if !report.installed.is_empty() {
        write_dataset_manifest(&layout, &report.installed)?;
    }

    if report.is_complete() {
        output::success(&format!("{} region(s) installed", report.installed.len()));
    } else {
        output::warning(&format!(
            "{} region(s) installed, failed: {:?}",
            report.installed.len(),
            report.failed_regions()
        ));
    }
    Ok(report)
}

/// Download, validate, decompress and place one region's CSV.
///
/// A payload that fails validation never reaches the decompressor and is
/// left in the root for inspection.
pub fn fetch_region(
    config: &RunConfig,
    layout: &InstallLayout,
    descriptor: &VariantDescriptor,
) -> Result<InstalledFile> {
    let region = descriptor.region.ok_or_else(|| {
        ProvisionError::InvalidRequest("dataset descriptor without a region".to_string())
    })?;

    output::sub_action("acquire");
    let payload = fetch(config.http(), descriptor, &scratch_path(config, descriptor))?;
    validate(&payload.path, payload.kind)?;

    output::sub_action("extract");
    let csv = extract(&payload.path, config.root(), payload.kind)?;
    payload.discard()?;

    output::sub_action("install");
    install::place_data(&csv, &layout.data_dir(SUBSYSTEM), &region.to_string())
}

/// Record newly placed regions, keeping entries from earlier runs for
/// regions not fetched this time.
fn write_dataset_manifest(layout: &InstallLayout, installed: &[InstalledFile]) -> Result<()> {
    let mut manifest = install::read_manifest(layout, Dependency::OpenCellId.name())?
        .unwrap_or_else(|| InstalledManifest::new(Dependency::OpenCellId.name(), "latest"));

    manifest
        .files
        .retain(|old| !installed.iter().any(|new| new.path == old.path));
    manifest.files.extend(installed.iter().cloned());
    manifest.files.sort_by(|a, b| a.path.cmp(&b.path));

    install::write_manifest(layout, &manifest)?;
    Ok(())
}

//! End-to-end provisioning pipelines
//!
//! Each workflow runs RESOLVE → ACQUIRE → BUILD/EXTRACT → INSTALL for one
//! dependency, strictly in order. The first failing stage stops the pipeline,
//! except in the dataset loop where a failure only skips its region.

pub mod cassandra;
pub mod libtorch;
pub mod ocid;

use crate::core::config::RunConfig;
use crate::resolve::VariantDescriptor;
use std::path::PathBuf;

/// Where a descriptor's working payload lives during a run.
pub(crate) fn scratch_path(config: &RunConfig, descriptor: &VariantDescriptor) -> PathBuf {
    config.root().join(&descriptor.scratch_name)
}

//! Native dependency provisioner
//!
//! Installs the native dependencies a C++ application links against into a
//! single installation root:
//!
//! - **cassandra**: the DataStax C/C++ driver, cloned and built from source
//!   with cmake, installed as `lib/libcassandra.*` plus `include/`.
//! - **libtorch**: the prebuilt PyTorch C++ distribution, downloaded and
//!   unpacked into the root.
//! - **ocid**: OpenCellID cell tower CSVs, one per mobile country code,
//!   placed at `data/ocid/<mcc>.csv`.
//!
//! Every workflow runs the same stages in order: resolve a variant for the
//! target platform, acquire it, build or extract it, install the artifacts.
//!
//! # Layout
//!
//! ```text
//! {root}/lib/                   shared libraries
//! {root}/include/               headers
//! {root}/data/ocid/<mcc>.csv    datasets
//! {root}/.nativedeps/<dep>.json install manifests
//! ```
//!
//! # Example
//!
//! ```no_run
//! use nativedeps::{HttpSettings, RunConfig, TargetEnvironment, workflows};
//!
//! let config = RunConfig::new("/opt/deps", TargetEnvironment::detect(), HttpSettings::default());
//! let report = workflows::ocid::provision(&config, "my-token", &[310, 311])?;
//! assert!(report.is_complete());
//! # Ok::<(), nativedeps::ProvisionError>(())
//! ```

pub mod core;
pub mod error;
pub mod helpers;
pub mod resolve;
pub mod workflows;

pub use crate::core::output;
pub use crate::core::{Arch, HttpSettings, Os, PlatformProfile, RunConfig, TargetEnvironment};
pub use error::{ProvisionError, Result};
pub use helpers::acquire::AcquireMode;
pub use helpers::install::{InstallAction, InstalledFile, InstalledManifest};
pub use helpers::internal::cmd::{ExitStatus, ProcessRunner, ProcessSpec, SystemRunner};
pub use resolve::{DEFAULT_ACCELERATOR, DEFAULT_REGIONS, Dependency, VariantDescriptor};

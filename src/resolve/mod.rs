//! Variant resolution
//!
//! Maps a target environment plus a user request (version, accelerator tag,
//! region list) to concrete [`VariantDescriptor`]s. Everything here is pure:
//! no filesystem or network access happens until a descriptor reaches the
//! acquire stage.

pub mod template;

use crate::core::platform::{Arch, Os, PlatformProfile, TargetEnvironment};
use crate::error::{ProvisionError, Result};
use template::UrlTemplate;

pub use template::RenderedUrl;

/// Upstream repository of the DataStax C/C++ driver.
pub const CASSANDRA_REPO: &str = "https://github.com/datastax/cpp-driver.git";

/// ABI version embedded in the driver's shared library names.
pub const CASSANDRA_SOVERSION: &str = "2";

pub const PYTORCH_BASE: &str = "https://download.pytorch.org";
pub const OCID_ENDPOINT: &str = "https://opencellid.org/ocid/downloads";
pub const DEFAULT_ACCELERATOR: &str = "cpu";

/// United States MCCs.
pub const DEFAULT_REGIONS: [u32; 7] = [310, 311, 312, 313, 314, 315, 316];

const LIBTORCH_ARCHIVE: &str =
    "{base}/libtorch/{accelerator}/libtorch-cxx11-abi-shared-with-deps-{version}%2B{accelerator}.zip";
const LIBTORCH_WHEEL_AARCH64: &str = "{base}/whl/{accelerator}/torch-{version}-cp312-cp312-manylinux_2_17_aarch64.manylinux2014_aarch64.whl";
const OCID_DOWNLOAD: &str = "{endpoint}?token={token}&type=mcc&file={region}.csv.gz";

const COMMON_CMAKE_FLAGS: [&str; 3] = [
    "-Wno-error=nontrivial-memcall",
    "-DCMAKE_BUILD_TYPE:STRING=Debug",
    "-DCMAKE_EXPORT_COMPILE_COMMANDS:BOOL=TRUE",
];

/// The dependencies this tool knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Cassandra,
    LibTorch,
    OpenCellId,
}

impl Dependency {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cassandra => "cassandra",
            Self::LibTorch => "libtorch",
            Self::OpenCellId => "ocid",
        }
    }
}

/// How a variant is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SourceBuild,
    BinaryArchive,
    DatasetArchive,
}

/// What the acquire stage produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Checkout,
    Zip,
    Gzip,
}

/// Resolved acquisition parameters for one item of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDescriptor {
    pub dependency: Dependency,
    pub strategy: Strategy,
    /// Clone or download URL, secrets included. Never print this.
    pub url_or_repo: String,
    /// Printable form of `url_or_repo` with secrets masked.
    pub display_url: String,
    pub version_tag: String,
    pub accelerator_tag: Option<String>,
    pub region: Option<u32>,
    /// cmake configure flags (source builds only).
    pub toolchain_flags: Vec<String>,
    pub payload: PayloadKind,
    /// File or directory name of the working payload inside the root.
    pub scratch_name: String,
    /// Top-level directory the archive unpacks to, when known.
    pub unpacked_dir: Option<String>,
}

/// A user request for one dependency.
#[derive(Debug, Clone)]
pub enum Request<'a> {
    Cassandra {
        version: &'a str,
    },
    LibTorch {
        version: &'a str,
        accelerator: &'a str,
    },
    OpenCellId {
        token: &'a str,
        regions: &'a [u32],
    },
}

/// Resolve a request into the descriptors to process, in order.
///
/// Source builds and binary archives resolve to exactly one descriptor;
/// datasets resolve to one per region.
pub fn resolve(env: &TargetEnvironment, request: &Request<'_>) -> Result<Vec<VariantDescriptor>> {
    match request {
        Request::Cassandra { version } => Ok(vec![resolve_cassandra(env, version)?]),
        Request::LibTorch {
            version,
            accelerator,
        } => Ok(vec![resolve_libtorch(env, version, accelerator)?]),
        Request::OpenCellId { token, regions } => resolve_ocid(token, regions),
    }
}

/// Strip a leading `v` and reject empty versions.
pub fn normalize_version(version: &str) -> Result<String> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    if version.is_empty() {
        return Err(ProvisionError::InvalidRequest(
            "version must not be empty".to_string(),
        ));
    }
    if version.contains(['/', '\\', '?', '#', '&']) || version.contains(char::is_whitespace) {
        return Err(ProvisionError::InvalidRequest(format!(
            "version contains invalid characters: {}",
            version
        )));
    }
    Ok(version.to_string())
}

/// Resolve the Cassandra driver source build for an environment.
pub fn resolve_cassandra(env: &TargetEnvironment, version: &str) -> Result<VariantDescriptor> {
    let profile = PlatformProfile::for_env(env, Dependency::Cassandra.name())?;
    let version = normalize_version(version)?;

    let mut toolchain_flags: Vec<String> =
        COMMON_CMAKE_FLAGS.iter().map(|f| f.to_string()).collect();
    toolchain_flags.extend(profile.toolchain_flags());

    Ok(VariantDescriptor {
        dependency: Dependency::Cassandra,
        strategy: Strategy::SourceBuild,
        url_or_repo: CASSANDRA_REPO.to_string(),
        display_url: CASSANDRA_REPO.to_string(),
        version_tag: version,
        accelerator_tag: None,
        region: None,
        toolchain_flags,
        payload: PayloadKind::Checkout,
        scratch_name: "cpp-driver".to_string(),
        unpacked_dir: None,
    })
}

/// Resolve the prebuilt LibTorch distribution for an environment.
pub fn resolve_libtorch(
    env: &TargetEnvironment,
    version: &str,
    accelerator: &str,
) -> Result<VariantDescriptor> {
    resolve_libtorch_from(PYTORCH_BASE, env, version, accelerator)
}

/// Like [`resolve_libtorch`] against a different download host.
pub fn resolve_libtorch_from(
    base: &str,
    env: &TargetEnvironment,
    version: &str,
    accelerator: &str,
) -> Result<VariantDescriptor> {
    let version = normalize_version(version)?;
    let accelerator = accelerator.trim();
    let accelerator = if accelerator.is_empty() {
        DEFAULT_ACCELERATOR
    } else {
        accelerator
    };

    // aarch64 has no standalone libtorch zip; the wheel carries the same
    // libraries and headers under torch/.
    let (template, scratch_name, unpacked_dir) = match (&env.os, &env.arch) {
        (Os::Linux, Arch::X86_64) => (
            LIBTORCH_ARCHIVE,
            format!("libtorch-{}.zip", version),
            "libtorch",
        ),
        (Os::Linux, Arch::Aarch64) => (
            LIBTORCH_WHEEL_AARCH64,
            format!("libtorch-{}.whl", version),
            "torch",
        ),
        _ => return Err(env.unsupported(Dependency::LibTorch.name())),
    };

    let url = UrlTemplate::new(template)
        .param("base", base.trim_end_matches('/'))
        .param("accelerator", accelerator)
        .param("version", version.as_str())
        .render()?;

    Ok(VariantDescriptor {
        dependency: Dependency::LibTorch,
        strategy: Strategy::BinaryArchive,
        url_or_repo: url.url,
        display_url: url.display,
        version_tag: version,
        accelerator_tag: Some(accelerator.to_string()),
        region: None,
        toolchain_flags: Vec::new(),
        payload: PayloadKind::Zip,
        scratch_name,
        unpacked_dir: Some(unpacked_dir.to_string()),
    })
}

/// Resolve one OpenCellID download per region.
pub fn resolve_ocid(token: &str, regions: &[u32]) -> Result<Vec<VariantDescriptor>> {
    resolve_ocid_from(OCID_ENDPOINT, token, regions)
}

/// Like [`resolve_ocid`] against a different endpoint.
pub fn resolve_ocid_from(
    endpoint: &str,
    token: &str,
    regions: &[u32],
) -> Result<Vec<VariantDescriptor>> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ProvisionError::InvalidRequest(
            "OpenCellID token must not be empty".to_string(),
        ));
    }
    if regions.is_empty() {
        return Err(ProvisionError::InvalidRequest(
            "at least one region is required".to_string(),
        ));
    }

    regions
        .iter()
        .map(|&region| {
            let url = UrlTemplate::new(OCID_DOWNLOAD)
                .param("endpoint", endpoint)
                .secret("token", token)
                .param("region", region.to_string())
                .render()?;
            Ok(VariantDescriptor {
                dependency: Dependency::OpenCellId,
                strategy: Strategy::DatasetArchive,
                url_or_repo: url.url,
                display_url: url.display,
                version_tag: "latest".to_string(),
                accelerator_tag: None,
                region: Some(region),
                toolchain_flags: Vec::new(),
                payload: PayloadKind::Gzip,
                scratch_name: format!("{}.csv.gz", region),
                unpacked_dir: None,
            })
        })
        .collect()
}

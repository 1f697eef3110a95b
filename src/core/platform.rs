//! Target environment detection and per-platform conventions.
//!
//! Every OS-specific decision (build program, compiler flags, shared library
//! naming) lives on [`PlatformProfile`]. The profile is selected once from the
//! [`TargetEnvironment`] and passed down to the stages that need it.

use crate::error::{ProvisionError, Result};
use std::fmt;
use std::path::PathBuf;

/// Operating system family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Os {
    Linux,
    Darwin,
    Other(String),
}

impl Os {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "linux" => Self::Linux,
            "darwin" | "macos" => Self::Darwin,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => f.write_str("linux"),
            Self::Darwin => f.write_str("darwin"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
    Other(String),
}

impl Arch {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Self::X86_64,
            "aarch64" | "arm64" => Self::Aarch64,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86_64 => f.write_str("x86_64"),
            Self::Aarch64 => f.write_str("aarch64"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Snapshot of the host taken once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEnvironment {
    pub os: Os,
    pub arch: Arch,
}

impl TargetEnvironment {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Read the running host's OS and architecture.
    pub fn detect() -> Self {
        Self::new(
            Os::parse(std::env::consts::OS),
            Arch::parse(std::env::consts::ARCH),
        )
    }

    pub(crate) fn unsupported(&self, dependency: &'static str) -> ProvisionError {
        ProvisionError::UnsupportedPlatform {
            dependency,
            os: self.os.to_string(),
            arch: self.arch.to_string(),
        }
    }
}

impl fmt::Display for TargetEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// Toolchain defaults and artifact naming for one platform family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformProfile {
    Linux,
    /// macOS with a Homebrew-provided LLVM and cmake. The system AppleClang
    /// cannot build the Cassandra driver.
    Darwin { arch: Arch },
}

impl PlatformProfile {
    /// Select the profile for an environment.
    ///
    /// Linux builds with whatever cmake and compiler are on PATH, so any
    /// architecture is accepted. Darwin needs an explicit
    /// `CMAKE_OSX_ARCHITECTURES` and is limited to x86_64 and arm64.
    pub fn for_env(env: &TargetEnvironment, dependency: &'static str) -> Result<Self> {
        match (&env.os, &env.arch) {
            (Os::Linux, _) => Ok(Self::Linux),
            (Os::Darwin, Arch::X86_64 | Arch::Aarch64) => Ok(Self::Darwin {
                arch: env.arch.clone(),
            }),
            _ => Err(env.unsupported(dependency)),
        }
    }

    fn homebrew_prefix(arch: &Arch) -> &'static str {
        match arch {
            Arch::X86_64 => "/usr/local",
            _ => "/opt/homebrew",
        }
    }

    /// The cmake executable to invoke.
    pub fn cmake_program(&self) -> PathBuf {
        match self {
            Self::Linux => PathBuf::from("cmake"),
            Self::Darwin { arch } => {
                PathBuf::from(format!("{}/bin/cmake", Self::homebrew_prefix(arch)))
            }
        }
    }

    /// Platform-specific cmake configure flags.
    pub fn toolchain_flags(&self) -> Vec<String> {
        match self {
            Self::Linux => Vec::new(),
            Self::Darwin { arch } => {
                let brew = Self::homebrew_prefix(arch);
                let osx_arch = match arch {
                    Arch::X86_64 => "x86_64",
                    _ => "arm64",
                };
                vec![
                    format!("-DCMAKE_C_COMPILER={}/opt/llvm/bin/clang", brew),
                    format!("-DCMAKE_CXX_COMPILER={}/opt/llvm/bin/clang++", brew),
                    format!("-DCMAKE_OSX_ARCHITECTURES={}", osx_arch),
                    "-DCMAKE_OSX_DEPLOYMENT_TARGET=11.0".to_string(),
                    "-DCMAKE_CXX_FLAGS=-std=c++17 -stdlib=libc++".to_string(),
                ]
            }
        }
    }

    /// Shared library file names for `lib<stem>`, concrete file first.
    ///
    /// The order mirrors the usual symlink chain: fully versioned, ABI
    /// (`soversion`) versioned, then the bare development name.
    pub fn shared_library_names(&self, stem: &str, version: &str, soversion: &str) -> [String; 3] {
        match self {
            Self::Linux => [
                format!("lib{}.so.{}", stem, version),
                format!("lib{}.so.{}", stem, soversion),
                format!("lib{}.so", stem),
            ],
            Self::Darwin { .. } => [
                format!("lib{}.{}.dylib", stem, version),
                format!("lib{}.{}.dylib", stem, soversion),
                format!("lib{}.dylib", stem),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Arch::parse("arm64"), Arch::Aarch64);
        assert_eq!(Arch::parse("amd64"), Arch::X86_64);
        assert_eq!(Os::parse("macos"), Os::Darwin);
        assert_eq!(Os::parse("Linux"), Os::Linux);
        assert_eq!(Os::parse("windows"), Os::Other("windows".to_string()));
    }

    #[test]
    fn test_linux_accepts_any_arch() {
        for arch in ["riscv64", "ppc64le", "s390x"] {
            let env = TargetEnvironment::new(Os::Linux, Arch::parse(arch));
            assert_eq!(
                PlatformProfile::for_env(&env, "cassandra").unwrap(),
                PlatformProfile::Linux
            );
        }
    }

    #[test]
    fn test_profile_rejects_unknown_darwin_arch_and_os() {
        let env = TargetEnvironment::new(Os::Darwin, Arch::parse("powerpc"));
        let err = PlatformProfile::for_env(&env, "cassandra").unwrap_err();
        assert!(matches!(err, ProvisionError::UnsupportedPlatform { .. }));

        let env = TargetEnvironment::new(Os::parse("windows"), Arch::X86_64);
        assert!(PlatformProfile::for_env(&env, "cassandra").is_err());
    }

    #[test]
    fn test_darwin_uses_homebrew_toolchain() {
        let profile = PlatformProfile::Darwin {
            arch: Arch::Aarch64,
        };
        assert_eq!(
            profile.cmake_program(),
            PathBuf::from("/opt/homebrew/bin/cmake")
        );
        let flags = profile.toolchain_flags();
        assert!(flags.contains(&"-DCMAKE_OSX_ARCHITECTURES=arm64".to_string()));
        assert!(flags.contains(&"-DCMAKE_CXX_FLAGS=-std=c++17 -stdlib=libc++".to_string()));

        let intel = PlatformProfile::Darwin { arch: Arch::X86_64 };
        assert_eq!(intel.cmake_program(), PathBuf::from("/usr/local/bin/cmake"));
    }

    #[test]
    fn test_linux_uses_path_cmake() {
        assert_eq!(PlatformProfile::Linux.cmake_program(), PathBuf::from("cmake"));
        assert!(PlatformProfile::Linux.toolchain_flags().is_empty());
    }

    #[test]
    fn test_shared_library_names() {
        let darwin = PlatformProfile::Darwin {
            arch: Arch::Aarch64,
        };
        assert_eq!(
            darwin.shared_library_names("cassandra", "3.0.1", "2"),
            [
                "libcassandra.3.0.1.dylib".to_string(),
                "libcassandra.2.dylib".to_string(),
                "libcassandra.dylib".to_string(),
            ]
        );
        assert_eq!(
            PlatformProfile::Linux.shared_library_names("cassandra", "2.17.1", "2"),
            [
                "libcassandra.so.2.17.1".to_string(),
                "libcassandra.so.2".to_string(),
                "libcassandra.so".to_string(),
            ]
        );
    }
}

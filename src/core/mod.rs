//! Core infrastructure shared by every workflow
//!
//! Run configuration, platform detection and progress narration.

pub mod config;
pub mod output;
pub mod platform;

pub use config::{HttpSettings, RunConfig};
pub use platform::{Arch, Os, PlatformProfile, TargetEnvironment};

//! Internal utility modules
//!
//! Shared plumbing used by the acquire, build and install helpers.

pub mod cmd;
pub mod fs_utils;
pub mod hash;

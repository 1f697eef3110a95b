//! Stage helpers
//!
//! Each pipeline stage lives in its own module and takes explicit inputs:
//!
//! - **acquire**: git checkouts, HTTP downloads, payload validation
//! - **build**: cmake orchestration and archive extraction
//! - **install**: library, header and data placement plus manifests
//! - **internal**: process execution, filesystem and hashing utilities

pub mod acquire;
pub mod build;
pub mod install;
pub mod internal;

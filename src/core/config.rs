//! Run configuration
//!
//! A [`RunConfig`] is built once in `main` and passed by reference to every
//! stage. Nothing in the library reads process-wide mutable state.

use super::platform::TargetEnvironment;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser-like identifier; some download CDNs answer 403 to library defaults.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 3600;

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub user_agent: String,
    /// Overall request timeout. `None` blocks until the transfer finishes.
    pub timeout: Option<Duration>,
}

impl HttpSettings {
    pub fn new(user_agent: impl Into<String>, timeout_secs: Option<u64>) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout: timeout_secs
                .map(|secs| Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))),
        }
    }

    /// Build a `ureq` agent carrying these settings.
    pub fn agent(&self) -> ureq::Agent {
        let mut builder = ureq::AgentBuilder::new().user_agent(&self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT, None)
    }
}

/// Immutable settings for one provisioning run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    root: PathBuf,
    env: TargetEnvironment,
    http: HttpSettings,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>, env: TargetEnvironment, http: HttpSettings) -> Self {
        Self {
            root: root.into(),
            env,
            http,
        }
    }

    /// Installation root under which `lib/`, `include/` and `data/` live.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env(&self) -> &TargetEnvironment {
        &self.env
    }

    pub fn http(&self) -> &HttpSettings {
        &self.http
    }
}

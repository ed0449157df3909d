//! # Configuration
//!
//! Two layers of configuration feed the routers:
//!
//! - [`AppConfig`] is the application-wide context (environment name,
//!   hostname, protocol, path prefix). Routers resolve their scope from it
//!   during [`Router::init`](crate::router::Router::init).
//! - [`RouterConfig`] describes one router and may carry an init hook that
//!   runs exactly once after the scope is resolved.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `ACTIONDISPATCH_ENV` | `env` | `dev` |
//! | `ACTIONDISPATCH_HOSTNAME` | `hostname` | none (any host) |
//! | `ACTIONDISPATCH_PROTOCOL` | `protocol` | `http` |
//! | `ACTIONDISPATCH_PATH_PREFIX` | `path_prefix` | `/` |
//!
//! The same fields can come from the `app:` section of a route manifest.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::sync::Arc;

use crate::router::Router;

fn default_env() -> String {
    "dev".to_string()
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_prefix() -> String {
    "/".to_string()
}

/// Application-wide context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment name
    #[serde(default = "default_env")]
    pub env: String,
    /// Hostname requests must carry; `None` accepts any host
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_prefix")]
    pub path_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            hostname: None,
            protocol: default_protocol(),
            path_prefix: default_prefix(),
        }
    }
}

impl AppConfig {
    /// Load from `ACTIONDISPATCH_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            env: get("ACTIONDISPATCH_ENV").unwrap_or_else(default_env),
            hostname: get("ACTIONDISPATCH_HOSTNAME"),
            protocol: get("ACTIONDISPATCH_PROTOCOL").unwrap_or_else(default_protocol),
            path_prefix: get("ACTIONDISPATCH_PATH_PREFIX").unwrap_or_else(default_prefix),
        }
    }

    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.env == "dev"
    }
}

/// Callback run once by [`Router::init`] after the scope is resolved.
pub type InitHook = Arc<dyn Fn(&mut Router) + Send + Sync>;

/// Configuration of one router.
///
/// Unset scope fields are inherited from [`AppConfig`].
#[derive(Clone, Default)]
pub struct RouterConfig {
    pub name: String,
    pub protocol: Option<String>,
    pub hostname: Option<String>,
    pub path_prefix: Option<String>,
    pub init_hook: Option<InitHook>,
}

impl RouterConfig {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn protocol(mut self, protocol: &str) -> Self {
        self.protocol = Some(protocol.to_string());
        self
    }

    #[must_use]
    pub fn hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.to_string());
        self
    }

    #[must_use]
    pub fn path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = Some(prefix.to_string());
        self
    }

    #[must_use]
    pub fn init_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Router) + Send + Sync + 'static,
    {
        self.init_hook = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("name", &self.name)
            .field("protocol", &self.protocol)
            .field("hostname", &self.hostname)
            .field("path_prefix", &self.path_prefix)
            .field("init_hook", &self.init_hook.is_some())
            .finish()
    }
}

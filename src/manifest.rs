//! # Route Manifest
//!
//! Declarative routers and actions, loaded from YAML or JSON.
//!
//! ```yaml
//! app:
//!   env: prod
//!   hostname: example.com
//! routers:
//!   - name: main
//!     path_prefix: /
//!     actions:
//!       - name: profile_edit
//!         pattern: /user/<d:user_id>/profile/edit/
//!         methods: [GET, POST]
//!         controller: users
//!         method: edit
//!         validator: { name: profile, methods: [POST] }
//!         transaction: { isolation: read_committed }
//!         input: [GET, POST, URI]
//!         defaults: { page: "1" }
//!         services: [mailer]
//! ```
//!
//! Loading fails fast: an unknown HTTP method, validator method or input
//! channel is a [`ConfigError`] before any router is built. Controller,
//! validator and service names are resolved later by the
//! [`DispatcherBuilder`](crate::dispatcher::DispatcherBuilder).

use crate::action::{ActionDef, TransactionSpec, ValidatorRef};
use crate::config::{AppConfig, RouterConfig};
use crate::controller::IsolationLevel;
use crate::error::ConfigError;
use crate::input::Channel;
use crate::server::HttpMethod;
use crate::validator::MethodTarget;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    app: AppConfig,
    #[serde(default)]
    routers: Vec<RouterEntry>,
}

#[derive(Debug, Deserialize)]
struct RouterEntry {
    name: String,
    protocol: Option<String>,
    hostname: Option<String>,
    path_prefix: Option<String>,
    #[serde(default)]
    actions: Vec<ActionEntry>,
}

#[derive(Debug, Deserialize)]
struct ActionEntry {
    name: String,
    pattern: Option<String>,
    #[serde(default)]
    methods: Vec<String>,
    controller: String,
    method: String,
    validator: Option<ValidatorEntry>,
    transaction: Option<TransactionEntry>,
    input: Option<Vec<String>>,
    #[serde(default)]
    defaults: HashMap<String, String>,
    #[serde(default)]
    services: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ValidatorEntry {
    name: String,
    #[serde(default)]
    methods: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TransactionEntry {
    #[serde(default)]
    isolation: Option<IsolationLevel>,
}

/// A parsed and checked route manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    app: AppConfig,
    routers: Vec<(RouterConfig, Vec<ActionDef>)>,
}

impl Manifest {
    /// Read a manifest file. `.yaml`/`.yml` files are YAML, anything else
    /// is JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ManifestIo`] when the file cannot be read, otherwise
    /// see [`Manifest::from_yaml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ManifestIo {
            path: path.display().to_string(),
            source,
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        let manifest = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };
        info!(
            path = %path.display(),
            routers = manifest.routers.len(),
            actions = manifest.action_count(),
            "Route manifest loaded"
        );
        Ok(manifest)
    }

    /// Parse YAML manifest text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ManifestParse`] for malformed text, or the error of the
    /// first entry that does not check out.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ManifestFile =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ManifestParse(e.to_string()))?;
        Self::from_file(file)
    }

    /// Parse JSON manifest text.
    ///
    /// # Errors
    ///
    /// See [`Manifest::from_yaml_str`].
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: ManifestFile =
            serde_json::from_str(content).map_err(|e| ConfigError::ManifestParse(e.to_string()))?;
        Self::from_file(file)
    }

    fn from_file(file: ManifestFile) -> Result<Self, ConfigError> {
        let routers = file
            .routers
            .into_iter()
            .map(|entry| {
                let mut config = RouterConfig::new(&entry.name);
                config.protocol = entry.protocol;
                config.hostname = entry.hostname;
                config.path_prefix = entry.path_prefix;
                let actions = entry
                    .actions
                    .into_iter()
                    .map(action_def)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((config, actions))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { app: file.app, routers })
    }

    #[must_use]
    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    #[must_use]
    pub fn routers(&self) -> &[(RouterConfig, Vec<ActionDef>)] {
        &self.routers
    }

    /// Total number of actions across routers.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.routers.iter().map(|(_, actions)| actions.len()).sum()
    }

    /// Controller names referenced by any action, sorted and deduplicated.
    #[must_use]
    pub fn controller_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .routers
            .iter()
            .flat_map(|(_, actions)| actions.iter().map(|a| a.controller.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Override the application context, e.g. with values from the
    /// environment.
    pub fn set_app(&mut self, app: AppConfig) {
        self.app = app;
    }

    pub(crate) fn into_parts(self) -> (AppConfig, Vec<(RouterConfig, Vec<ActionDef>)>) {
        (self.app, self.routers)
    }
}

fn parse_method(action: &str, token: &str) -> Result<HttpMethod, ConfigError> {
    token
        .parse::<HttpMethod>()
        .map_err(|_| ConfigError::InvalidMethod(format!("{token} (action `{action}`)")))
}

fn action_def(entry: ActionEntry) -> Result<ActionDef, ConfigError> {
    let methods = entry
        .methods
        .iter()
        .map(|m| parse_method(&entry.name, m))
        .collect::<Result<Vec<_>, _>>()?;

    let validator = entry
        .validator
        .map(|v| {
            MethodTarget::parse(&v.methods)
                .map(|target| ValidatorRef { name: v.name, target })
                .map_err(|token| ConfigError::InvalidMethod(format!("{token} (validator of `{}`)", entry.name)))
        })
        .transpose()?;

    let channels = entry
        .input
        .map(|tokens| {
            tokens
                .iter()
                .map(|t| t.parse::<Channel>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| ConfigError::ManifestParse(format!("action `{}`: {reason}", entry.name)))
        })
        .transpose()?;

    Ok(ActionDef {
        name: entry.name,
        pattern: entry.pattern,
        methods,
        controller: entry.controller,
        method: entry.method,
        validator,
        transaction: entry.transaction.map(|t| TransactionSpec { isolation: t.isolation }),
        channels,
        defaults: entry.defaults,
        services: entry.services,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
app:
  hostname: example.com
routers:
  - name: main
    actions:
      - name: profile_edit
        pattern: /user/<d:user_id>/profile/edit/
        methods: [GET, post]
        controller: users
        method: edit
        validator: { name: profile, methods: [POST] }
        transaction: { isolation: serializable }
        input: [get, uri]
        defaults: { page: "1" }
      - name: home
        pattern: /
        controller: pages
        method: home
"#;

    #[test]
    fn test_yaml_manifest() {
        let manifest = Manifest::from_yaml_str(YAML).unwrap();
        assert_eq!(manifest.app().hostname.as_deref(), Some("example.com"));
        assert_eq!(manifest.app().protocol, "http");
        assert_eq!(manifest.action_count(), 2);
        assert_eq!(manifest.controller_names(), vec!["pages", "users"]);

        let (router, actions) = &manifest.routers()[0];
        assert_eq!(router.name, "main");
        let edit = &actions[0];
        assert_eq!(edit.methods, vec![HttpMethod::Get, HttpMethod::Post]);
        assert_eq!(
            edit.validator.as_ref().unwrap().target,
            MethodTarget::Methods(vec![HttpMethod::Post])
        );
        assert_eq!(
            edit.transaction.unwrap().isolation,
            Some(IsolationLevel::Serializable)
        );
        assert_eq!(edit.channels.as_deref(), Some(&[Channel::Get, Channel::Uri][..]));
        assert_eq!(edit.defaults.get("page").map(String::as_str), Some("1"));
        assert!(actions[1].methods.is_empty());
    }

    #[test]
    fn test_unknown_method_fails_fast() {
        let yaml = "routers:\n  - name: main\n    actions:\n      - { name: a, pattern: /, methods: [FETCH], controller: c, method: m }\n";
        let err = Manifest::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMethod(ref m) if m.starts_with("FETCH")));
    }

    #[test]
    fn test_unknown_channel_fails_fast() {
        let json = r#"{"routers":[{"name":"main","actions":[{"name":"a","pattern":"/","controller":"c","method":"m","input":["BODY"]}]}]}"#;
        assert!(matches!(
            Manifest::from_json_str(json).unwrap_err(),
            ConfigError::ManifestParse(_)
        ));
    }

    #[test]
    fn test_malformed_text() {
        assert!(matches!(
            Manifest::from_json_str("{not json").unwrap_err(),
            ConfigError::ManifestParse(_)
        ));
    }
}

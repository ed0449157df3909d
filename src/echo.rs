//! Echo wiring for a route manifest.
//!
//! Every controller method named by the manifest answers with its own name
//! and the controller-input view it received. Validators accept everything,
//! services are unit placeholders and transactions are only logged. Used by
//! the CLI to exercise routing and dispatch without application code.

use crate::controller::{Controller, DataAccess, IsolationLevel};
use crate::dispatcher::Dispatcher;
use crate::error::ConfigError;
use crate::input::Input;
use crate::manifest::Manifest;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

/// Data access that only logs the transaction bracket.
#[derive(Debug, Default)]
pub struct EchoDataAccess;

impl DataAccess for EchoDataAccess {
    fn start_transaction(&self, isolation: Option<IsolationLevel>) -> anyhow::Result<()> {
        info!(isolation = ?isolation.map(|i| i.to_string()), "echo: transaction started");
        Ok(())
    }

    fn commit(&self) -> anyhow::Result<()> {
        info!("echo: transaction committed");
        Ok(())
    }

    fn rollback(&self) -> anyhow::Result<()> {
        info!("echo: transaction rolled back");
        Ok(())
    }
}

/// A controller whose `methods` each return
/// `{"controller": .., "method": .., "input": {..}}`.
#[must_use]
pub fn echo_controller<S: AsRef<str>>(name: &str, methods: &[S]) -> Controller {
    let mut controller = Controller::new(name).with_data_access(Arc::new(EchoDataAccess));
    for method in methods {
        let controller_name = name.to_string();
        let method_name = method.as_ref().to_string();
        controller = controller.method(method.as_ref(), move |input: &Input| {
            Ok(json!({
                "controller": controller_name,
                "method": method_name,
                "input": input.to_value(),
            })
            .into())
        });
    }
    controller
}

/// Build a dispatcher for `manifest` with echo controllers behind every
/// action.
///
/// # Errors
///
/// Pattern errors and duplicate names from the manifest.
pub fn echo_dispatcher(manifest: Manifest) -> Result<Dispatcher, ConfigError> {
    let mut methods: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut validators = BTreeSet::new();
    let mut services = BTreeSet::new();
    for (_, actions) in manifest.routers() {
        for action in actions {
            methods
                .entry(action.controller.clone())
                .or_default()
                .insert(action.method.clone());
            if let Some(validator) = &action.validator {
                validators.insert(validator.name.clone());
            }
            services.extend(action.services.iter().cloned());
        }
    }

    let mut builder = Dispatcher::builder();
    for (controller, names) in &methods {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        builder = builder.controller(echo_controller(controller, &names));
    }
    for name in &validators {
        builder = builder.validator(name, |_: &Input| true);
    }
    for name in &services {
        builder = builder.service(name, ());
    }
    builder.manifest(manifest).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Outcome;
    use crate::server::{HttpMethod, Request};

    #[test]
    fn test_echo_controller_returns_input() {
        let mut input = Input::new();
        input.set("id", "7");
        let out = echo_controller("users", &["show"])
            .invoke("show", &input, &[])
            .unwrap();
        assert_eq!(
            out,
            Outcome::Value(json!({ "controller": "users", "method": "show", "input": { "id": "7" } }))
        );
    }

    #[test]
    fn test_echo_dispatcher_from_manifest() {
        let manifest = Manifest::from_yaml_str(
            r"
routers:
  - name: main
    actions:
      - name: show
        pattern: /user/<d:id>
        controller: users
        method: show
        validator: { name: user }
        transaction: {}
        services: [mailer]
",
        )
        .unwrap();
        let dispatcher = echo_dispatcher(manifest).unwrap();
        let response = dispatcher.respond(Request::new(HttpMethod::Get, "http://localhost/user/3").unwrap());
        assert_eq!(response.status, 200);
        assert_eq!(response.body.unwrap()["input"]["id"], json!("3"));
    }
}

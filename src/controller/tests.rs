use super::*;
use crate::input::Input;
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Ledger {
    calls: Mutex<Vec<String>>,
}

impl Ledger {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DataAccess for Ledger {
    fn start_transaction(&self, isolation: Option<IsolationLevel>) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("begin {isolation:?}"));
        Ok(())
    }

    fn commit(&self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("commit".into());
        Ok(())
    }

    fn rollback(&self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("rollback".into());
        Ok(())
    }
}

#[test]
fn test_invoke_passes_input() {
    let ctrl = Controller::new("users").method("show", |input| {
        Ok(Outcome::Value(json!({ "id": input.get("id").cloned() })))
    });
    let mut input = Input::new();
    input.set("id", json!("7"));

    let out = ctrl.invoke("show", &input, &[]).unwrap();
    assert_eq!(out, Outcome::Value(json!({ "id": "7" })));
}

#[test]
fn test_invoke_unknown_method_errors() {
    let ctrl = Controller::new("users");
    assert!(ctrl.invoke("missing", &Input::new(), &[]).is_err());
}

#[test]
fn test_services_injected_in_order() {
    let mut services = Services::new();
    services.register("greeting", String::from("hello"));
    services.register("count", 3_u32);

    let ctrl = Controller::new("greeter").method_with_services(
        "greet",
        &["greeting", "count"],
        |_input, services| {
            let greeting = service_as::<String>(&services[0]).cloned().unwrap_or_default();
            let count = service_as::<u32>(&services[1]).copied().unwrap_or_default();
            Ok(Outcome::Value(json!(format!("{greeting} x{count}"))))
        },
    );

    let names = ctrl.get_method("greet").unwrap().services().to_vec();
    let resolved = services.resolve(&names).unwrap();
    let out = ctrl.invoke("greet", &Input::new(), &resolved).unwrap();
    assert_eq!(out, Outcome::Value(json!("hello x3")));
}

#[test]
fn test_resolve_reports_missing_service() {
    let services = Services::new();
    let err = services.resolve(&["mailer".to_string()]).unwrap_err();
    assert_eq!(err, "mailer");
}

#[test]
fn test_guard_commit() {
    let ledger = Arc::new(Ledger::default());
    let guard = TransactionGuard::begin(
        ledger.clone(),
        Arc::from("save"),
        Some(IsolationLevel::Serializable),
    )
    .unwrap();
    guard.commit().unwrap();
    assert_eq!(ledger.calls(), vec!["begin Some(Serializable)", "commit"]);
}

#[test]
fn test_guard_drop_rolls_back_once() {
    let ledger = Arc::new(Ledger::default());
    {
        let _guard = TransactionGuard::begin(ledger.clone(), Arc::from("save"), None).unwrap();
    }
    assert_eq!(ledger.calls(), vec!["begin None", "rollback"]);
}

#[test]
fn test_guard_explicit_rollback_not_repeated_on_drop() {
    let ledger = Arc::new(Ledger::default());
    let guard = TransactionGuard::begin(ledger.clone(), Arc::from("save"), None).unwrap();
    guard.rollback().unwrap();
    assert_eq!(ledger.calls(), vec!["begin None", "rollback"]);
}

#[test]
fn test_isolation_level_serde() {
    let level: IsolationLevel = serde_json::from_value(json!("repeatable_read")).unwrap();
    assert_eq!(level, IsolationLevel::RepeatableRead);
    assert_eq!(level.to_string(), "REPEATABLE READ");
}

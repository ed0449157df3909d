//! # Controller Module
//!
//! Controllers are the code an action ultimately runs. Each one is an
//! explicit, name-keyed table of methods built at startup, so action
//! resolution never derives names from conventions at request time.
//!
//! A method receives the controller-input view first and then the services
//! its registration declared, resolved from [`Services`]:
//!
//! ```rust
//! use actiondispatch::controller::{Controller, Outcome};
//! use serde_json::json;
//!
//! let users = Controller::new("users").method("show", |input| {
//!     match input.get_str("user_id") {
//!         Some(id) => Ok(Outcome::Value(json!({ "id": id }))),
//!         None => Ok(Outcome::Failure),
//!     }
//! });
//! assert!(users.has_method("show"));
//! ```
//!
//! Returning [`Outcome::Failure`] is a graceful failure: the transaction is
//! rolled back and the graceful-fail hook runs, but no error escapes.
//! Returning `Err` is a hard failure and is re-raised to the caller.
//!
//! ## Transactions
//!
//! Actions configured as transactional run inside a [`TransactionGuard`]
//! opened on the controller's [`DataAccess`] collaborator.

mod core;
#[cfg(test)]
mod tests;
mod transaction;

pub use core::{service_as, Controller, ControllerMethod, MethodFn, Outcome, Service, Services};
pub use transaction::{DataAccess, IsolationLevel, TransactionGuard};

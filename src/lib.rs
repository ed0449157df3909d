//! # actiondispatch
//!
//! **actiondispatch** is the request-dispatch engine of an MVC web framework: it takes an
//! inbound HTTP request, resolves it to a named action bound to a controller method, runs
//! validation and the controller inside an optional transaction, and turns the outcome into
//! response events that render the HTTP response.
//!
//! ## Overview
//!
//! Nothing in the engine calls a controller directly. Every logical occurrence (the inbound
//! request, a 200, a redirect, a 404) is an [`event::Event`] that travels along a propagation
//! path of routers, controllers and actions: DOWN from the router to the action, then UP in
//! reverse. Listeners registered on those nodes route, validate, execute and respond, and any
//! listener may discard the event or schedule a successor event.
//!
//! ## Architecture
//!
//! - **[`input`]** - Ordered, nested parameter container with dot-path access
//! - **[`server`]** - Request construction (descriptor, raw text, file) and the outbound response
//! - **[`event`]** - Events, propagation paths and the listener bus
//! - **[`router`]** - Pattern compilation, action matching, reverse routing, router scope
//! - **[`action`]** - Compiled actions, lifecycle hooks and the action table
//! - **[`controller`]** - Controller method tables, services and transactions
//! - **[`validator`]** - Validators and the rule-based validator
//! - **[`dispatcher`]** - The builder and the per-request cycle with its execution state machine
//! - **[`config`]** / **[`manifest`]** - Application context, router configuration, route manifests
//! - **[`logging`]** - `tracing-subscriber` setup for binaries
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Dispatcher
//!     participant Router as Router listener
//!     participant Action as Action listener
//!     participant Exec as Execution state machine
//!     participant Controller
//!
//!     Caller->>Dispatcher: dispatch(Request)
//!     Dispatcher->>Dispatcher: first router whose scope accepts the request
//!     Dispatcher->>Router: Request event (DOWN)
//!     Router->>Router: match actions in declaration order
//!
//!     alt No action matched
//!         Router-->>Dispatcher: discard + auto-trigger 404
//!     end
//!
//!     Router->>Action: path extended to [router, controller, action]
//!     Action->>Action: bind controller, run validator
//!
//!     alt Validation failed
//!         Action-->>Dispatcher: discard + on_data_validation_fail
//!     end
//!
//!     Dispatcher->>Exec: execute(action)
//!     Exec->>Controller: on_pre_exec, method(input, services)
//!     Controller-->>Exec: value | failure | error
//!     Exec->>Exec: commit or roll back
//!
//!     Dispatcher->>Action: Request event (UP)
//!     Action->>Action: on_success schedules Response200
//!     Dispatcher->>Action: Response200 event (DOWN, UP)
//!     Dispatcher-->>Caller: DispatchReport (HttpResponse + trace)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use actiondispatch::action::ActionDef;
//! use actiondispatch::config::RouterConfig;
//! use actiondispatch::controller::Controller;
//! use actiondispatch::dispatcher::Dispatcher;
//! use actiondispatch::server::{HttpMethod, Request};
//! use serde_json::json;
//!
//! let profiles = Controller::new("users")
//!     .method("edit", |input| Ok(json!({ "editing": input.get_str("user_id") }).into()));
//!
//! let dispatcher = Dispatcher::builder()
//!     .controller(profiles)
//!     .router(
//!         RouterConfig::new("main"),
//!         vec![ActionDef::new("profile_edit", "/user/<d:user_id>/profile/edit/", "users", "edit")],
//!     )
//!     .build()
//!     .unwrap();
//!
//! let request = Request::new(HttpMethod::Get, "http://localhost/user/42/profile/edit/").unwrap();
//! let report = dispatcher.dispatch(request).unwrap();
//! assert_eq!(report.response.unwrap().body, Some(json!({ "editing": "42" })));
//!
//! assert_eq!(
//!     dispatcher.reverse_uri("profile_edit", &["7"]).unwrap(),
//!     "http://localhost/user/7/profile/edit/"
//! );
//! ```
//!
//! ## Errors
//!
//! Match and validation failures never escape: they become 404 responses or validation hooks.
//! Configuration mistakes fail at build time with [`error::ConfigError`]; a controller that
//! raises is re-raised as [`error::DispatchError::Execution`] after its transaction has been
//! rolled back.

pub mod action;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod event;
pub mod ids;
pub mod input;
pub mod logging;
pub mod manifest;
pub mod router;
pub mod server;
pub mod validator;

pub use dispatcher::{DispatchReport, Dispatcher, DispatcherBuilder};
pub use error::{ConfigError, DispatchError, RequestError, ReverseError};
pub use manifest::Manifest;

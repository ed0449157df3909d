//! # Dispatcher Module
//!
//! Drives one request through the engine.
//!
//! ## Request Flow
//!
//! 1. The first router whose scope accepts the request becomes the root of
//!    the request event's propagation path.
//! 2. **DOWN**: the router's listener resolves an action and extends the
//!    path to `[router, controller, action]`. The action's listener binds
//!    the controller and runs the validator (if it applies to the request
//!    method). A rejection discards the event and runs
//!    `on_data_validation_fail`.
//! 3. **Execution**: with the event still alive, the controller method runs
//!    inside the action's transaction (see [`ExecState`]).
//! 4. **UP**: after a success the action's `on_success` hook runs; the
//!    default schedules a 200 response event carrying the result.
//! 5. **Auto-trigger**: scheduled response events are dispatched as fresh
//!    cycles along the same path. The last non-discarded response event is
//!    rendered into the [`HttpResponse`](crate::server::HttpResponse).
//!
//! A controller error is re-raised out of [`Dispatcher::dispatch`] after
//! the rollback and `on_hard_fail`. [`Dispatcher::respond`] turns it into a
//! 500 response instead.
//!
//! ## Example
//!
//! ```rust
//! use actiondispatch::action::ActionDef;
//! use actiondispatch::config::RouterConfig;
//! use actiondispatch::controller::Controller;
//! use actiondispatch::dispatcher::Dispatcher;
//! use actiondispatch::server::{HttpMethod, Request};
//! use serde_json::json;
//!
//! let users = Controller::new("users")
//!     .method("show", |input| Ok(json!({ "id": input.get_str("id") }).into()));
//!
//! let dispatcher = Dispatcher::builder()
//!     .controller(users)
//!     .router(
//!         RouterConfig::new("main"),
//!         vec![ActionDef::new("user_show", "/user/<d:id>", "users", "show")],
//!     )
//!     .build()
//!     .unwrap();
//!
//! let request = Request::new(HttpMethod::Get, "http://localhost/user/7").unwrap();
//! let response = dispatcher.respond(request);
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body, Some(json!({ "id": "7" })));
//! ```

mod context;
mod core;
mod exec;
mod listeners;

pub use context::{DispatchContext, ExecState, Registry};
pub use core::{DispatchReport, Dispatcher, DispatcherBuilder};

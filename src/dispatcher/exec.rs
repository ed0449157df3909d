//! Execution state machine of a matched action.
//!
//! ```text
//! Matched -> Validating -> Executing -> Succeeded    -> Responded
//!                 |                  -> GracefulFail -> (Responded)
//!                 v                  -> HardFail     => error re-raised
//!              Rejected
//! ```
//!
//! The transaction, when configured, is opened before `on_pre_exec` and is
//! committed or rolled back before the state machine leaves `Executing`.

use crate::action::{Action, HookContext};
use crate::controller::{Outcome, TransactionGuard};
use crate::error::DispatchError;
use crate::event::Event;
use crate::input::Input;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::context::{DispatchContext, ExecState};

/// Run `action`'s controller method for the request carried by `event`.
///
/// # Errors
///
/// - [`DispatchError::Execution`] when the method (or a hook) raised. The
///   transaction has been rolled back and `on_hard_fail` has run.
/// - [`DispatchError::Transaction`] when the data-access collaborator
///   failed to open, commit or roll back.
pub(crate) fn execute(action: &Action, event: &mut Event, cx: &mut DispatchContext) -> Result<(), DispatchError> {
    let registry = Arc::clone(&cx.registry);
    let execution = |source: anyhow::Error| DispatchError::Execution {
        action: action.name().to_string(),
        source,
    };
    let transaction = |source: anyhow::Error| DispatchError::Transaction {
        action: action.name().to_string(),
        source,
    };

    let controller = match cx.controller() {
        Some(controller) => Arc::clone(controller),
        None => registry
            .controller(action.controller())
            .cloned()
            .ok_or_else(|| execution(anyhow::anyhow!("controller `{}` is not registered", action.controller())))?,
    };

    let input = match cx.input.take() {
        Some(input) => input,
        None => event
            .request_data()
            .map(|request| action.controller_input(request))
            .unwrap_or_default(),
    };

    cx.enter(ExecState::Executing);
    let hooks = Arc::clone(action.hooks());
    let hook_cx = HookContext::new(action, registry.actions(), &input);

    let guard = match action.transaction() {
        Some(spec) => {
            let data_access = controller.data_access().cloned().ok_or_else(|| {
                transaction(anyhow::anyhow!(
                    "controller `{}` has no data access",
                    controller.name()
                ))
            });
            let opened = data_access.and_then(|data_access| {
                TransactionGuard::begin(data_access, Arc::from(action.name()), spec.isolation)
                    .map_err(transaction)
            });
            match opened {
                Ok(guard) => Some(guard),
                Err(e) => {
                    cx.enter(ExecState::HardFail);
                    return Err(e);
                }
            }
        }
        None => None,
    };

    info!(
        action = %action.name(),
        controller = %controller.name(),
        method = %action.method(),
        transactional = guard.is_some(),
        "Executing controller method"
    );

    let outcome = hooks
        .on_pre_exec(&hook_cx, event)
        .and_then(|()| controller.invoke(action.method(), &input, action.services()));

    let result = match outcome {
        Err(err) => {
            cx.enter(ExecState::HardFail);
            if let Some(guard) = guard {
                if let Err(rollback_err) = guard.rollback() {
                    error!(
                        action = %action.name(),
                        error = %rollback_err,
                        "Rollback after hard failure failed"
                    );
                }
            }
            error!(action = %action.name(), error = %err, "Controller method raised");
            hooks.on_hard_fail(&hook_cx, event, &err);
            Err(execution(err))
        }
        Ok(Outcome::Failure) => {
            if let Some(guard) = guard {
                guard.rollback().map_err(transaction)?;
            }
            cx.enter(ExecState::GracefulFail);
            warn!(action = %action.name(), "Controller method reported failure");
            hooks.on_graceful_fail(&hook_cx, event).map_err(execution)
        }
        Ok(Outcome::Value(value)) => {
            if let Some(guard) = guard {
                if let Err(e) = guard.commit() {
                    cx.enter(ExecState::HardFail);
                    return Err(transaction(e));
                }
            }
            cx.enter(ExecState::Succeeded);
            debug!(action = %action.name(), "Controller method succeeded");
            event.set_result(value);
            hooks.on_post_exec(&hook_cx, event).map_err(execution)
        }
    };

    cx.input = Some(input);
    result
}

/// Hook context for listeners that run outside [`execute`].
pub(crate) fn with_hook_context<R>(
    action: &Action,
    cx: &DispatchContext,
    f: impl FnOnce(&HookContext<'_>) -> R,
) -> R {
    let empty = Input::new();
    let input = cx.input().unwrap_or(&empty);
    f(&HookContext::new(action, cx.registry().actions(), input))
}

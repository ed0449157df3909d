use crate::error::ReverseError;
use crate::event::{Event, RedirectCode, ResponseEvent};
use crate::input::Input;
use crate::validator::ValidationIssue;
use serde_json::Value;

use super::core::Action;
use super::table::ActionTable;

/// What a hook can see besides the event: the action it belongs to, the
/// whole action table (for reverse routing) and the controller input of the
/// current dispatch.
pub struct HookContext<'a> {
    action: &'a Action,
    actions: &'a ActionTable,
    input: &'a Input,
}

impl<'a> HookContext<'a> {
    #[must_use]
    pub fn new(action: &'a Action, actions: &'a ActionTable, input: &'a Input) -> Self {
        Self {
            action,
            actions,
            input,
        }
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        self.action
    }

    #[must_use]
    pub fn actions(&self) -> &ActionTable {
        self.actions
    }

    /// Controller-input view of this dispatch. Empty before it was built.
    #[must_use]
    pub fn input(&self) -> &Input {
        self.input
    }

    /// Schedule a 303 redirect to another action.
    ///
    /// # Errors
    ///
    /// [`ReverseError`] when the action is unknown or `params` is short.
    pub fn redirect_to_action<S: AsRef<str>>(
        &self,
        event: &mut Event,
        action: &str,
        params: &[S],
    ) -> Result<(), ReverseError> {
        self.redirect_to_action_with(event, action, params, RedirectCode::SeeOther)
    }

    /// Schedule a redirect to another action with an explicit code.
    ///
    /// # Errors
    ///
    /// [`ReverseError`] when the action is unknown or `params` is short.
    pub fn redirect_to_action_with<S: AsRef<str>>(
        &self,
        event: &mut Event,
        action: &str,
        params: &[S],
        code: RedirectCode,
    ) -> Result<(), ReverseError> {
        let uri = self.actions.reverse_uri(action, params)?;
        event.redirect(uri, code);
        Ok(())
    }
}

/// Lifecycle hooks of an action.
///
/// Every method has a default, so an implementation overrides only what it
/// cares about. Hooks may set an auto-trigger on the event they receive,
/// which is how responses and redirects are produced. Returning an error
/// aborts the dispatch.
pub trait ActionHooks: Send + Sync {
    /// Before the controller method runs, inside the transaction.
    fn on_pre_exec(&self, _cx: &HookContext<'_>, _event: &mut Event) -> anyhow::Result<()> {
        Ok(())
    }

    /// After a successful call and commit; the result is already set.
    fn on_post_exec(&self, _cx: &HookContext<'_>, _event: &mut Event) -> anyhow::Result<()> {
        Ok(())
    }

    /// UP phase of a succeeded request. The default schedules a 200 response
    /// carrying the result unless another successor was already set.
    fn on_success(&self, _cx: &HookContext<'_>, event: &mut Event) -> anyhow::Result<()> {
        if event.auto_trigger().is_none() {
            let body = event.result().cloned();
            event.set_auto_trigger(Event::response(ResponseEvent::ok(body)));
        }
        Ok(())
    }

    /// The controller returned the failure sentinel; already rolled back.
    fn on_graceful_fail(&self, _cx: &HookContext<'_>, _event: &mut Event) -> anyhow::Result<()> {
        Ok(())
    }

    /// The controller raised; already rolled back. The error is re-raised
    /// to the caller after this returns.
    fn on_hard_fail(&self, _cx: &HookContext<'_>, _event: &mut Event, _error: &anyhow::Error) {}

    /// The validator rejected the input; the event is already discarded.
    fn on_data_validation_fail(
        &self,
        _cx: &HookContext<'_>,
        _event: &mut Event,
        _issues: &[ValidationIssue],
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A 200 response event reached the action. `result` is the result of
    /// the request event that triggered it.
    fn on_response_200(
        &self,
        _cx: &HookContext<'_>,
        _event: &mut Event,
        _result: Option<&Value>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Hooks with every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl ActionHooks for DefaultHooks {}

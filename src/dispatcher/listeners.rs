use crate::action::Action;
use crate::event::{Event, EventType, Listener, Node, Phase};
use crate::router::Router;
use anyhow::anyhow;
use std::sync::Arc;
use tracing::{debug, warn};

use super::context::{DispatchContext, ExecState};
use super::exec::with_hook_context;

/// Routes request events on the way DOWN.
pub(crate) struct RouterListener {
    router: Arc<Router>,
}

impl RouterListener {
    pub(crate) fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

impl Listener<DispatchContext> for RouterListener {
    fn on_event(&self, event: &mut Event, _cx: &mut DispatchContext) -> anyhow::Result<()> {
        if event.phase() == Phase::Down {
            self.router.handle(event);
        }
        Ok(())
    }
}

/// Binds, validates and completes one action.
///
/// Registered on the action node for request events and for 200 response
/// events.
pub(crate) struct ActionListener {
    action: Arc<Action>,
}

impl ActionListener {
    pub(crate) fn new(action: Arc<Action>) -> Self {
        Self { action }
    }

    fn on_request_down(&self, event: &mut Event, cx: &mut DispatchContext) -> anyhow::Result<()> {
        let action = &self.action;
        let controller = match event.path().prev_node(action.node()) {
            Some(Node::Controller(name)) => cx.registry().controller(name).cloned(),
            _ => None,
        }
        .ok_or_else(|| anyhow!("action `{}` is not preceded by a registered controller", action.name()))?;
        cx.bind(controller);

        let Some(request) = event.request_data() else {
            return Ok(());
        };
        let Some(bound) = action.validator_for(request.method()) else {
            return Ok(());
        };

        cx.enter(ExecState::Validating);
        let input = action.controller_input(request);
        let issues = bound.validator.validate(&input);
        cx.input = Some(input);
        if issues.is_empty() {
            debug!(action = %action.name(), validator = %bound.name, "Input accepted");
            return Ok(());
        }

        warn!(
            action = %action.name(),
            validator = %bound.name,
            issues = issues.len(),
            first = %issues[0],
            "Input rejected by validator"
        );
        cx.enter(ExecState::Rejected);
        event.discard();
        with_hook_context(action, cx, |hook_cx| {
            action.hooks().on_data_validation_fail(hook_cx, event, &issues)
        })
    }
}

impl Listener<DispatchContext> for ActionListener {
    fn on_event(&self, event: &mut Event, cx: &mut DispatchContext) -> anyhow::Result<()> {
        let action = &self.action;
        match (event.event_type(), event.phase()) {
            (EventType::Request, Phase::Down) => self.on_request_down(event, cx),
            (EventType::Request, Phase::Up) if cx.state() == ExecState::Succeeded => {
                with_hook_context(action, cx, |hook_cx| action.hooks().on_success(hook_cx, event))
            }
            (EventType::Response200, Phase::Down) => {
                let result = event.last_dispatched_event().and_then(Event::result).cloned();
                with_hook_context(action, cx, |hook_cx| {
                    action.hooks().on_response_200(hook_cx, event, result.as_ref())
                })
            }
            _ => Ok(()),
        }
    }
}

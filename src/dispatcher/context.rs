use crate::action::ActionTable;
use crate::config::AppConfig;
use crate::controller::Controller;
use crate::input::Input;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Execution state of the matched action within one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecState {
    /// No action bound yet
    Idle,
    /// The action's DOWN listener bound the controller
    Matched,
    /// The validator is inspecting the controller input
    Validating,
    /// The validator rejected the input; nothing was executed
    Rejected,
    /// The controller method is running (inside the transaction, if any)
    Executing,
    Succeeded,
    /// The method returned the failure sentinel
    GracefulFail,
    /// The method raised
    HardFail,
    /// A response event was rendered
    Responded,
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Read-only state shared by every dispatch.
pub struct Registry {
    pub(crate) actions: ActionTable,
    pub(crate) controllers: HashMap<String, Arc<Controller>>,
    pub(crate) app: AppConfig,
}

impl Registry {
    #[must_use]
    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    #[must_use]
    pub fn controller(&self, name: &str) -> Option<&Arc<Controller>> {
        self.controllers.get(name)
    }

    #[must_use]
    pub fn app(&self) -> &AppConfig {
        &self.app
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("actions", &self.actions.len())
            .field("controllers", &self.controllers.len())
            .field("app", &self.app)
            .finish()
    }
}

/// Per-dispatch context threaded through every listener.
///
/// Holds the scratch state of the one in-flight dispatch: the bound
/// controller, the controller input and the execution state history. It is
/// created fresh for each request and dropped when the dispatch returns.
pub struct DispatchContext {
    pub(crate) registry: Arc<Registry>,
    controller: Option<Arc<Controller>>,
    pub(crate) input: Option<Input>,
    states: SmallVec<[ExecState; 8]>,
}

impl DispatchContext {
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        let mut states = SmallVec::new();
        states.push(ExecState::Idle);
        Self {
            registry,
            controller: None,
            input: None,
            states,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Current execution state.
    #[must_use]
    pub fn state(&self) -> ExecState {
        self.states.last().copied().unwrap_or(ExecState::Idle)
    }

    /// Every state entered so far, starting with `Idle`.
    #[must_use]
    pub fn states(&self) -> &[ExecState] {
        &self.states
    }

    /// Controller bound by the matched action.
    #[must_use]
    pub fn controller(&self) -> Option<&Arc<Controller>> {
        self.controller.as_ref()
    }

    /// Controller-input view, once built.
    #[must_use]
    pub fn input(&self) -> Option<&Input> {
        self.input.as_ref()
    }

    pub(crate) fn bind(&mut self, controller: Arc<Controller>) {
        self.controller = Some(controller);
        self.enter(ExecState::Matched);
    }

    pub(crate) fn enter(&mut self, state: ExecState) {
        trace!(from = %self.state(), to = %state, "Execution state transition");
        self.states.push(state);
    }

    pub(crate) fn into_states(self) -> Vec<ExecState> {
        self.states.into_vec()
    }
}

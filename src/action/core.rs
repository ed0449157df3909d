use crate::controller::{IsolationLevel, Service};
use crate::error::{ConfigError, ReverseError};
use crate::event::Node;
use crate::input::{Channel, Input};
use crate::router::{matcher, CompiledPattern};
use crate::server::{HttpMethod, Request};
use crate::validator::{MethodTarget, Validator};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::hooks::{ActionHooks, DefaultHooks};

/// Reference from an action to a registered validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorRef {
    pub name: String,
    /// Request methods the validator runs for
    pub target: MethodTarget,
}

/// Transaction bracket requested by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionSpec {
    /// `None` uses the data-access collaborator's default
    pub isolation: Option<IsolationLevel>,
}

/// Static description of an action, as written by hand or loaded from a
/// route manifest. Resolved into an [`Action`] when the dispatcher is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionDef {
    pub name: String,
    /// `None` means the action never matches a request
    pub pattern: Option<String>,
    /// Empty allows every method
    pub methods: Vec<HttpMethod>,
    pub controller: String,
    pub method: String,
    pub validator: Option<ValidatorRef>,
    pub transaction: Option<TransactionSpec>,
    /// Channels merged into the controller input, later ones winning.
    /// `None` uses GET, POST, COOKIE, URI.
    pub channels: Option<Vec<Channel>>,
    /// Placeholder defaults used when a capture is empty
    pub defaults: HashMap<String, String>,
    /// Overrides the services declared by the controller method when not empty
    pub services: Vec<String>,
}

impl ActionDef {
    #[must_use]
    pub fn new(name: &str, pattern: &str, controller: &str, method: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: Some(pattern.to_string()),
            controller: controller.to_string(),
            method: method.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn methods(mut self, methods: &[HttpMethod]) -> Self {
        self.methods = methods.to_vec();
        self
    }

    #[must_use]
    pub fn validator(mut self, name: &str, target: MethodTarget) -> Self {
        self.validator = Some(ValidatorRef {
            name: name.to_string(),
            target,
        });
        self
    }

    #[must_use]
    pub fn transaction(mut self, isolation: Option<IsolationLevel>) -> Self {
        self.transaction = Some(TransactionSpec { isolation });
        self
    }

    #[must_use]
    pub fn channels(mut self, channels: &[Channel]) -> Self {
        self.channels = Some(channels.to_vec());
        self
    }

    #[must_use]
    pub fn default_param(mut self, name: &str, value: &str) -> Self {
        self.defaults.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn services(mut self, services: &[&str]) -> Self {
        self.services = services.iter().map(|s| (*s).to_string()).collect();
        self
    }
}

/// A validator resolved for an action.
#[derive(Clone)]
pub struct BoundValidator {
    pub name: Arc<str>,
    pub validator: Arc<dyn Validator>,
    pub target: MethodTarget,
}

impl fmt::Debug for BoundValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundValidator")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A compiled route bound to one controller method.
///
/// Built once and shared read-only; all per-request execution state lives
/// in the dispatch context, never here.
#[derive(Clone)]
pub struct Action {
    name: Arc<str>,
    node: Node,
    router: Arc<str>,
    pattern: Option<CompiledPattern>,
    methods: SmallVec<[HttpMethod; 4]>,
    controller: Arc<str>,
    method: Arc<str>,
    validator: Option<BoundValidator>,
    transaction: Option<TransactionSpec>,
    channels: SmallVec<[Channel; 4]>,
    services: Vec<Service>,
    hooks: Arc<dyn ActionHooks>,
    origin: String,
    valid: bool,
}

impl Action {
    /// Compile `def` for a router with the given scope.
    ///
    /// `prefix` is prepended to the pattern unless it already starts with
    /// it; `origin` (`protocol://host`) is used for absolute reverse URIs.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when the pattern does not compile.
    pub fn compile(def: &ActionDef, router: &str, prefix: &str, origin: &str) -> Result<Self, ConfigError> {
        let pattern = def
            .pattern
            .as_deref()
            .map(|p| CompiledPattern::compile(&matcher::scoped_pattern(prefix, p), &def.defaults))
            .transpose()?;

        Ok(Self {
            name: Arc::from(def.name.as_str()),
            node: Node::action(&def.name),
            router: Arc::from(router),
            pattern,
            methods: def.methods.iter().copied().collect(),
            controller: Arc::from(def.controller.as_str()),
            method: Arc::from(def.method.as_str()),
            validator: None,
            transaction: def.transaction,
            channels: def
                .channels
                .as_deref()
                .unwrap_or(&Channel::DEFAULT_ORDER)
                .iter()
                .copied()
                .collect(),
            services: Vec::new(),
            hooks: Arc::new(DefaultHooks),
            origin: origin.to_string(),
            valid: true,
        })
    }

    /// An action whose metadata failed to resolve. It keeps its name for
    /// reporting but never matches.
    #[must_use]
    pub fn invalid(def: &ActionDef, router: &str) -> Self {
        Self {
            name: Arc::from(def.name.as_str()),
            node: Node::action(&def.name),
            router: Arc::from(router),
            pattern: None,
            methods: def.methods.iter().copied().collect(),
            controller: Arc::from(def.controller.as_str()),
            method: Arc::from(def.method.as_str()),
            validator: None,
            transaction: def.transaction,
            channels: Channel::DEFAULT_ORDER.iter().copied().collect(),
            services: Vec::new(),
            hooks: Arc::new(DefaultHooks),
            origin: String::new(),
            valid: false,
        }
    }

    pub(crate) fn set_validator(&mut self, validator: BoundValidator) {
        self.validator = Some(validator);
    }

    pub(crate) fn set_services(&mut self, services: Vec<Service>) {
        self.services = services;
    }

    pub(crate) fn set_hooks(&mut self, hooks: Arc<dyn ActionHooks>) {
        self.hooks = hooks;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The listener node this action occupies on a propagation path.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Name of the router the action was registered on.
    #[must_use]
    pub fn router(&self) -> &str {
        &self.router
    }

    #[must_use]
    pub fn pattern(&self) -> Option<&CompiledPattern> {
        self.pattern.as_ref()
    }

    /// Allowed methods; empty allows all.
    #[must_use]
    pub fn allowed_methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    #[must_use]
    pub fn allows_method(&self, method: HttpMethod) -> bool {
        self.methods.is_empty() || self.methods.contains(&method)
    }

    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// The controller node that precedes this action on a path.
    #[must_use]
    pub fn controller_node(&self) -> Node {
        Node::Controller(Arc::clone(&self.controller))
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn validator(&self) -> Option<&BoundValidator> {
        self.validator.as_ref()
    }

    /// The validator to run for a request with `method`, if any applies.
    #[must_use]
    pub fn validator_for(&self, method: HttpMethod) -> Option<&BoundValidator> {
        self.validator.as_ref().filter(|v| v.target.applies(method))
    }

    #[must_use]
    pub fn transaction(&self) -> Option<TransactionSpec> {
        self.transaction
    }

    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    #[must_use]
    pub fn hooks(&self) -> &Arc<dyn ActionHooks> {
        &self.hooks
    }

    /// `false` once metadata resolution failed; invalid actions never match.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Evaluate this action against `request`. See [`matcher::match_action`].
    #[must_use]
    pub fn match_request(&self, request: &Request) -> Option<Input> {
        matcher::match_action(self, request)
    }

    /// The merged controller-input view for `request`.
    #[must_use]
    pub fn controller_input(&self, request: &Request) -> Input {
        request.controller_input(&self.channels)
    }

    /// Reverse-route to a path, substituting `params` left to right.
    ///
    /// An action without a pattern reverses to an empty path.
    ///
    /// # Errors
    ///
    /// [`ReverseError::MissingParams`] when too few parameters are given.
    pub fn reverse_path<S: AsRef<str>>(&self, params: &[S]) -> Result<String, ReverseError> {
        match &self.pattern {
            Some(pattern) => pattern.reverse(params),
            None => Ok(String::new()),
        }
    }

    /// Reverse-route to an absolute URI on the action's router.
    ///
    /// # Errors
    ///
    /// As for [`reverse_path`](Self::reverse_path).
    pub fn reverse_uri<S: AsRef<str>>(&self, params: &[S]) -> Result<String, ReverseError> {
        Ok(format!("{}{}", self.origin, self.reverse_path(params)?))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("router", &self.router)
            .field("pattern", &self.pattern.as_ref().map(CompiledPattern::source))
            .field("methods", &self.methods)
            .field("controller", &self.controller)
            .field("method", &self.method)
            .field("validator", &self.validator)
            .field("transaction", &self.transaction)
            .field("channels", &self.channels)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}

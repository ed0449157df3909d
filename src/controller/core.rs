use crate::input::Input;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::transaction::DataAccess;

/// A framework-injected collaborator handed to controller methods after
/// the controller input.
pub type Service = Arc<dyn Any + Send + Sync>;

/// What a controller method produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Success; the value becomes the event result
    Value(Value),
    /// The failure sentinel: graceful failure, rolls back without raising
    Failure,
}

impl Outcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure)
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

/// Controller method signature: the controller-input view first, then the
/// injected services in declaration order.
pub type MethodFn = dyn Fn(&Input, &[Service]) -> anyhow::Result<Outcome> + Send + Sync;

/// One callable entry of a controller.
#[derive(Clone)]
pub struct ControllerMethod {
    services: Vec<String>,
    func: Arc<MethodFn>,
}

impl ControllerMethod {
    /// Names of the services injected after the input, in order.
    #[must_use]
    pub fn services(&self) -> &[String] {
        &self.services
    }
}

impl fmt::Debug for ControllerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerMethod")
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

/// A named table of methods plus an optional data-access collaborator for
/// transactional actions.
///
/// Controllers are registered once and shared read-only between requests.
#[derive(Clone)]
pub struct Controller {
    name: Arc<str>,
    methods: HashMap<String, ControllerMethod>,
    data_access: Option<Arc<dyn DataAccess>>,
}

impl Controller {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            methods: HashMap::new(),
            data_access: None,
        }
    }

    /// Add a method that takes no injected services.
    #[must_use]
    pub fn method<F>(self, name: &str, func: F) -> Self
    where
        F: Fn(&Input) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        self.method_with_services(name, &[], move |input, _| func(input))
    }

    /// Add a method receiving the named services after the input.
    #[must_use]
    pub fn method_with_services<F>(mut self, name: &str, services: &[&str], func: F) -> Self
    where
        F: Fn(&Input, &[Service]) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        self.methods.insert(
            name.to_string(),
            ControllerMethod {
                services: services.iter().map(|s| (*s).to_string()).collect(),
                func: Arc::new(func),
            },
        );
        self
    }

    #[must_use]
    pub fn with_data_access(mut self, data_access: Arc<dyn DataAccess>) -> Self {
        self.data_access = Some(data_access);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    #[must_use]
    pub fn get_method(&self, name: &str) -> Option<&ControllerMethod> {
        self.methods.get(name)
    }

    /// Method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn data_access(&self) -> Option<&Arc<dyn DataAccess>> {
        self.data_access.as_ref()
    }

    /// Call `method` with the input and already-resolved services.
    ///
    /// # Errors
    ///
    /// Whatever the method raises, or an error when the method is not part of
    /// this controller.
    pub fn invoke(&self, method: &str, input: &Input, services: &[Service]) -> anyhow::Result<Outcome> {
        let entry = self
            .methods
            .get(method)
            .ok_or_else(|| anyhow::anyhow!("controller `{}` has no method `{method}`", self.name))?;
        (entry.func)(input, services)
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .field("data_access", &self.data_access.is_some())
            .finish()
    }
}

/// Name-keyed service container resolved at build time.
#[derive(Clone, Default)]
pub struct Services {
    entries: HashMap<String, Service>,
}

impl Services {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Any + Send + Sync>(&mut self, name: &str, service: T) {
        self.entries.insert(name.to_string(), Arc::new(service));
    }

    pub fn register_shared(&mut self, name: &str, service: Service) {
        self.entries.insert(name.to_string(), service);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Service> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolve `names` in order. Returns the first missing name on failure.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Service>, String> {
        names
            .iter()
            .map(|name| self.entries.get(name).cloned().ok_or_else(|| name.clone()))
            .collect()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Services").field("names", &names).finish()
    }
}

/// Downcast an injected service to its concrete type.
#[must_use]
pub fn service_as<T: Any + Send + Sync>(service: &Service) -> Option<&T> {
    (**service).downcast_ref::<T>()
}

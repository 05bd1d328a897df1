use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

use super::inject::Provider;
use super::mapping::{ServiceInstance, ServiceMapping};
use crate::errors::BoxError;

/// Identifier of a service, unique within one initialization run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(Cow<'static, str>);

impl ServiceId {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ServiceId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl From<String> for ServiceId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

/// What an init hook sees: the shared state plus every service already `Ready`.
pub struct InitContext<'a, S: ?Sized> {
    state: &'a S,
    services: &'a ServiceMapping,
}

impl<'a, S: ?Sized> InitContext<'a, S> {
    pub(crate) fn new(state: &'a S, services: &'a ServiceMapping) -> Self {
        Self { state, services }
    }

    pub fn state(&self) -> &'a S {
        self.state
    }

    /// Services initialized so far. Declared dependencies are always present.
    pub fn services(&self) -> &'a ServiceMapping {
        self.services
    }
}

/// State capabilities win over the ones exported by initialized services.
impl<S: Provider + ?Sized> Provider for InitContext<'_, S> {
    fn provide(&self, capability: TypeId) -> Option<Box<dyn Any + Send>> {
        self.state
            .provide(capability)
            .or_else(|| self.services.provide(capability))
    }
}

pub type InitFn<S> =
    Box<dyn Fn(&InitContext<'_, S>) -> Result<ServiceInstance, BoxError> + Send + Sync>;

/// A named service, its init hook and the services it must come after.
pub struct ServiceDefinition<S: ?Sized> {
    id: ServiceId,
    depends_on: Vec<ServiceId>,
    init: InitFn<S>,
}

impl<S: ?Sized> ServiceDefinition<S> {
    pub fn new<F>(id: impl Into<ServiceId>, init: F) -> Self
    where
        F: Fn(&InitContext<'_, S>) -> Result<ServiceInstance, BoxError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            depends_on: Vec::new(),
            init: Box::new(init),
        }
    }

    /// Appends dependencies, keeping declaration order and dropping repeats.
    pub fn with_dependencies<I, D>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<ServiceId>,
    {
        for dependency in dependencies {
            let dependency = dependency.into();
            if !self.depends_on.contains(&dependency) {
                self.depends_on.push(dependency);
            }
        }
        self
    }

    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    pub fn depends_on(&self) -> &[ServiceId] {
        &self.depends_on
    }

    pub(crate) fn init(&self, context: &InitContext<'_, S>) -> Result<ServiceInstance, BoxError> {
        (self.init)(context)
    }
}

impl<S: ?Sized> fmt::Debug for ServiceDefinition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependencies_keep_order_without_repeats() {
        let def: ServiceDefinition<()> =
            ServiceDefinition::new("users", |_| Ok(ServiceInstance::new(())))
                .with_dependencies(["auth", "storage", "auth"]);

        assert_eq!(def.id().as_str(), "users");
        assert_eq!(
            def.depends_on(),
            &[ServiceId::from_static("auth"), ServiceId::from_static("storage")]
        );
    }

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(ServiceId::from("auth"), ServiceId::from("auth".to_string()));
        assert_eq!(ServiceId::from_static("auth").to_string(), "auth");
    }
}

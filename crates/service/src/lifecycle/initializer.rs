use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use super::definition::{InitContext, ServiceDefinition, ServiceId};
use super::mapping::ServiceMapping;
use crate::errors::BoxError;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("service {id}: service dependency cycle detected ({})", join(.chain))]
    CyclicDependency { id: ServiceId, chain: Vec<ServiceId> },
    #[error("service {id}: service definition is missing")]
    MissingDefinition { id: ServiceId },
    #[error("service {id}: service defined more than once")]
    DuplicateDefinition { id: ServiceId },
    #[error("services already initialized")]
    AlreadyInitialized,
    #[error("error initializing service {id}: {source}")]
    Service {
        id: ServiceId,
        #[source]
        source: BoxError,
    },
}

fn join(chain: &[ServiceId]) -> String {
    chain
        .iter()
        .map(ServiceId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ServiceState {
    #[default]
    NotStarted,
    InProgress,
    Ready,
}

struct Initializer<'a, S: ?Sized> {
    state: &'a S,
    definitions: HashMap<ServiceId, &'a ServiceDefinition<S>>,
    states: HashMap<ServiceId, ServiceState>,
    // ids currently `InProgress`, outermost first
    path: Vec<ServiceId>,
    services: ServiceMapping,
}

impl<'a, S: ?Sized> Initializer<'a, S> {
    fn init_with_dependencies(&mut self, id: &ServiceId) -> Result<(), InitError> {
        let definition = *self
            .definitions
            .get(id)
            .ok_or_else(|| InitError::MissingDefinition { id: id.clone() })?;

        match self.states.get(id).copied().unwrap_or_default() {
            ServiceState::InProgress => {
                return Err(InitError::CyclicDependency {
                    id: id.clone(),
                    chain: self.cycle_through(id),
                })
            }
            ServiceState::Ready => return Ok(()),
            ServiceState::NotStarted => {}
        }

        self.states.insert(id.clone(), ServiceState::InProgress);
        self.path.push(id.clone());

        for dependency in definition.depends_on() {
            self.init_with_dependencies(dependency)?;
        }

        debug!(service = %id, "initializing service");
        let context = InitContext::new(self.state, &self.services);
        let instance = definition
            .init(&context)
            .map_err(|source| InitError::Service { id: id.clone(), source })?;

        self.path.pop();
        self.services.insert(id.clone(), instance);
        self.states.insert(id.clone(), ServiceState::Ready);
        debug!(service = %id, "service ready");

        Ok(())
    }

    fn cycle_through(&self, id: &ServiceId) -> Vec<ServiceId> {
        let start = self.path.iter().position(|p| p == id).unwrap_or(0);
        let mut chain = self.path[start..].to_vec();
        chain.push(id.clone());
        chain
    }
}

/// Initializes every service once, dependencies first.
///
/// `state` is handed unchanged to each init hook. The first failure aborts
/// the whole batch and no mapping is returned.
pub fn initialize<S: ?Sized>(
    state: &S,
    definitions: &[ServiceDefinition<S>],
) -> Result<ServiceMapping, InitError> {
    let mut by_id = HashMap::with_capacity(definitions.len());
    for definition in definitions {
        if by_id.insert(definition.id().clone(), definition).is_some() {
            return Err(InitError::DuplicateDefinition {
                id: definition.id().clone(),
            });
        }
    }

    let mut initializer = Initializer {
        state,
        definitions: by_id,
        states: HashMap::with_capacity(definitions.len()),
        path: Vec::new(),
        services: ServiceMapping::default(),
    };

    for definition in definitions {
        initializer.init_with_dependencies(definition.id())?;
    }

    info!(services = initializer.services.len(), "services initialized");
    Ok(initializer.services)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::errors::{ErrorKind, ServiceError};
    use crate::lifecycle::ServiceInstance;

    /// Records init order; shared by all test services.
    #[derive(Default)]
    struct Journal {
        order: Mutex<Vec<String>>,
    }

    impl Journal {
        fn position(&self, id: &str) -> usize {
            self.order.lock().iter().position(|i| i == id).unwrap()
        }
    }

    fn service(id: &'static str, deps: &[&'static str]) -> ServiceDefinition<Journal> {
        ServiceDefinition::new(id, move |ctx: &InitContext<'_, Journal>| {
            ctx.state().order.lock().push(id.to_string());
            Ok(ServiceInstance::new(id))
        })
        .with_dependencies(deps.iter().copied())
    }

    fn counted(id: &'static str, deps: &[&'static str], calls: Arc<AtomicUsize>) -> ServiceDefinition<Journal> {
        ServiceDefinition::new(id, move |_: &InitContext<'_, Journal>| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(ServiceInstance::new(()))
        })
        .with_dependencies(deps.iter().copied())
    }

    #[test]
    fn dependencies_come_first() {
        let journal = Journal::default();
        let defs = vec![
            service("wishes", &["users", "auth"]),
            service("users", &["auth"]),
            service("auth", &[]),
            service("standalone", &[]),
        ];

        let mapping = initialize(&journal, &defs).unwrap();

        assert_eq!(mapping.len(), 4);
        assert!(journal.position("auth") < journal.position("users"));
        assert!(journal.position("users") < journal.position("wishes"));
        assert_eq!(*mapping.get::<&str>(&"standalone".into()).unwrap(), "standalone");
    }

    #[test]
    fn shared_dependency_initialized_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut defs = vec![counted("shared", &[], calls.clone())];
        let names: Vec<&'static str> = (0..10)
            .map(|i| &*Box::leak(format!("dependent-{i}").into_boxed_str()))
            .collect();
        for name in names {
            defs.push(service(name, &["shared"]));
        }

        let mapping = initialize(&Journal::default(), &defs).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(mapping.len(), 11);
    }

    #[test]
    fn cycles_are_detected() {
        let cases: Vec<Vec<ServiceDefinition<Journal>>> = vec![
            vec![service("a", &["a"])],
            vec![service("a", &["b"]), service("b", &["a"])],
            vec![service("a", &["c"]), service("b", &["a"]), service("c", &["b"])],
        ];

        for defs in cases {
            let err = initialize(&Journal::default(), &defs).unwrap_err();
            assert!(matches!(err, InitError::CyclicDependency { .. }), "{err}");
            assert_eq!(err.kind(), ErrorKind::CyclicDependency);
        }
    }

    #[test]
    fn cycle_chain_is_reported() {
        let defs = vec![service("a", &["b"]), service("b", &["c"]), service("c", &["a"])];
        let err = initialize(&Journal::default(), &defs).unwrap_err();
        match err {
            InitError::CyclicDependency { chain, .. } => {
                assert_eq!(chain.len(), 4);
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_dependency() {
        let defs = vec![service("users", &["auth"])];
        let err = initialize(&Journal::default(), &defs).unwrap_err();
        assert!(matches!(&err, InitError::MissingDefinition { id } if id.as_str() == "auth"));
        assert_eq!(err.kind(), ErrorKind::MissingDefinition);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let defs = vec![service("auth", &[]), service("auth", &[])];
        let err = initialize(&Journal::default(), &defs).unwrap_err();
        assert!(matches!(err, InitError::DuplicateDefinition { .. }));
    }

    #[test]
    fn init_error_aborts_batch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let defs = vec![
            ServiceDefinition::new("broken", |_: &InitContext<'_, Journal>| {
                Err(ServiceError::Validation("boom".into()).into())
            }),
            counted("users", &["broken"], calls.clone()),
        ];

        let err = initialize(&Journal::default(), &defs).unwrap_err();

        assert!(matches!(&err, InitError::Service { id, .. } if id.as_str() == "broken"));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ready_dependencies_visible_to_dependents() {
        let defs = vec![
            service("auth", &[]),
            ServiceDefinition::new("users", |ctx: &InitContext<'_, Journal>| {
                let auth = ctx.services().get::<&str>(&"auth".into())?;
                Ok(ServiceInstance::new(format!("users after {auth}")))
            })
            .with_dependencies(["auth"]),
        ];

        let mapping = initialize(&Journal::default(), &defs).unwrap();
        let users = mapping.get::<String>(&"users".into()).unwrap();
        assert_eq!(users.as_str(), "users after auth");
    }
}

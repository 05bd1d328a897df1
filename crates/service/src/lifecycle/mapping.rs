use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::definition::ServiceId;
use super::inject::Provider;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("service {0} is missing in service mapping")]
    MissingService(ServiceId),
    #[error("invalid service type for {id}: expected {expected}")]
    InvalidType { id: ServiceId, expected: &'static str },
}

/// An initialized service, shared between the mapping and its users.
#[derive(Clone)]
pub struct ServiceInstance {
    value: Arc<dyn Any + Send + Sync>,
    exports: Option<Arc<dyn Provider + Send + Sync>>,
    type_name: &'static str,
}

impl ServiceInstance {
    pub fn new<T: Send + Sync + 'static>(service: T) -> Self {
        Self {
            value: Arc::new(service),
            exports: None,
            type_name: type_name::<T>(),
        }
    }

    /// Wraps a service that also provides capabilities to services initialized after it.
    pub fn providing<T: Provider + Send + Sync + 'static>(service: T) -> Self {
        let service = Arc::new(service);
        Self {
            value: service.clone(),
            exports: Some(service),
            type_name: type_name::<T>(),
        }
    }

    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("type", &self.type_name)
            .field("provides", &self.exports.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Entries {
    by_id: HashMap<ServiceId, ServiceInstance>,
    // insertion order, which is the order services became ready
    order: Vec<ServiceId>,
}

/// `ServiceId -> instance`, written only by the initializer.
///
/// Cloning shares the same underlying map.
#[derive(Clone, Default)]
pub struct ServiceMapping {
    entries: Arc<RwLock<Entries>>,
}

impl ServiceMapping {
    pub(crate) fn insert(&self, id: ServiceId, instance: ServiceInstance) {
        let mut entries = self.entries.write();
        if entries.by_id.insert(id.clone(), instance).is_none() {
            entries.order.push(id);
        }
    }

    pub fn instance(&self, id: &ServiceId) -> Option<ServiceInstance> {
        self.entries.read().by_id.get(id).cloned()
    }

    /// Returns the service registered under `id` as its concrete type.
    pub fn get<T: Send + Sync + 'static>(&self, id: &ServiceId) -> Result<Arc<T>, LookupError> {
        let instance = self
            .instance(id)
            .ok_or_else(|| LookupError::MissingService(id.clone()))?;
        instance.downcast::<T>().ok_or_else(|| LookupError::InvalidType {
            id: id.clone(),
            expected: type_name::<T>(),
        })
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.entries.read().by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().by_id.is_empty()
    }

    pub fn ids(&self) -> Vec<ServiceId> {
        let mut ids = self.entries.read().order.clone();
        ids.sort();
        ids
    }
}

/// When several ready services export the same capability, the one that
/// became ready first provides it.
impl Provider for ServiceMapping {
    fn provide(&self, capability: TypeId) -> Option<Box<dyn Any + Send>> {
        let entries = self.entries.read();
        entries
            .order
            .iter()
            .filter_map(|id| entries.by_id.get(id)?.exports.as_ref())
            .find_map(|exports| exports.provide(capability))
    }
}

impl fmt::Debug for ServiceMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_map()
            .entries(entries.order.iter().filter_map(|id| Some((id, entries.by_id.get(id)?))))
            .finish()
    }
}

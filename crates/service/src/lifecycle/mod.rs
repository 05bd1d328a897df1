//! Service lifecycle: definitions, dependency-ordered initialization and
//! capability injection.

mod definition;
mod initializer;
mod inject;
mod mapping;

pub use definition::{InitContext, InitFn, ServiceDefinition, ServiceId};
pub use initializer::{initialize, InitError};
pub use inject::{
    inject_capability, inject_service_with, offer, validate_arg_interfaces, Capability, Consumer,
    InjectError, InjectFn, Provider, Slot,
};
pub use mapping::{LookupError, ServiceInstance, ServiceMapping};

//! Capability injection.
//!
//! A consumer asks for a capability by owning a [`Slot`] for it and handing
//! that slot out from [`Consumer::slot`]. A provider offers a capability by
//! answering [`Provider::provide`]. Both sides are matched at injection time,
//! so the initializer never needs to know which capabilities exist.

use std::any::{Any, TypeId};
use std::fmt;

use thiserror::Error;
use tracing::trace;

/// Marker type naming one injectable capability and the value it carries.
pub trait Capability: 'static {
    type Value: Clone + Send + 'static;

    const NAME: &'static str;

    fn id() -> TypeId {
        TypeId::of::<Self>()
    }
}

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("consumer not expecting {capability} injection")]
    NotNeeded { capability: &'static str },
    #[error("provider doesn't provide {capability}")]
    NotProvided { capability: &'static str },
    #[error("slot for {capability} has unexpected type")]
    SlotMismatch { capability: &'static str },
}

/// Consumer side: holds the value once injected.
pub struct Slot<C: Capability> {
    value: Option<C::Value>,
}

impl<C: Capability> Slot<C> {
    pub fn set(&mut self, value: C::Value) {
        self.value = Some(value);
    }

    /// Injected value, `NotProvided` until injection ran.
    pub fn get(&self) -> Result<&C::Value, InjectError> {
        self.value
            .as_ref()
            .ok_or(InjectError::NotProvided { capability: C::NAME })
    }

    pub fn take(&mut self) -> Result<C::Value, InjectError> {
        self.value
            .take()
            .ok_or(InjectError::NotProvided { capability: C::NAME })
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Hands out this slot if it is the one for `capability`.
    pub fn claim(&mut self, capability: TypeId) -> Option<&mut dyn Any> {
        if capability == C::id() {
            Some(self as &mut dyn Any)
        } else {
            None
        }
    }
}

impl<C: Capability> Default for Slot<C> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<C: Capability> fmt::Debug for Slot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("capability", &C::NAME)
            .field("set", &self.value.is_some())
            .finish()
    }
}

/// Something that can ask for capabilities.
pub trait Consumer {
    /// The [`Slot`] for `capability`, or `None` if it is not needed.
    fn slot(&mut self, capability: TypeId) -> Option<&mut dyn Any>;
}

/// Something that can hand out capabilities.
pub trait Provider {
    /// A boxed `C::Value` for the capability `C` identified by `capability`.
    fn provide(&self, capability: TypeId) -> Option<Box<dyn Any + Send>>;
}

/// Answers `capability` with `value()` if it is `C`; helper for [`Provider`] impls.
pub fn offer<C: Capability>(
    capability: TypeId,
    value: impl FnOnce() -> C::Value,
) -> Option<Box<dyn Any + Send>> {
    if capability == C::id() {
        Some(Box::new(value()) as Box<dyn Any + Send>)
    } else {
        None
    }
}

/// Function injecting one capability from `provider` into `consumer`.
pub type InjectFn = fn(&mut dyn Consumer, &dyn Provider) -> Result<(), InjectError>;

/// Checks both sides of capability `C` and returns the consumer slot with the
/// provided value.
pub fn validate_arg_interfaces<'c, C: Capability>(
    consumer: &'c mut dyn Consumer,
    provider: &dyn Provider,
) -> Result<(&'c mut Slot<C>, C::Value), InjectError> {
    let slot = consumer
        .slot(C::id())
        .ok_or(InjectError::NotNeeded { capability: C::NAME })?
        .downcast_mut::<Slot<C>>()
        .ok_or(InjectError::SlotMismatch { capability: C::NAME })?;

    let value = provider
        .provide(C::id())
        .and_then(|value| value.downcast::<C::Value>().ok())
        .ok_or(InjectError::NotProvided { capability: C::NAME })?;

    Ok((slot, *value))
}

/// Generic body of every capability's inject function.
pub fn inject_capability<C: Capability>(
    consumer: &mut dyn Consumer,
    provider: &dyn Provider,
) -> Result<(), InjectError> {
    let (slot, value) = validate_arg_interfaces::<C>(consumer, provider)?;
    slot.set(value);
    trace!(capability = C::NAME, "capability injected");
    Ok(())
}

/// Applies `injects` in order, stopping at the first failure.
pub fn inject_service_with(
    service: &mut dyn Consumer,
    provider: &dyn Provider,
    injects: &[InjectFn],
) -> Result<(), InjectError> {
    for inject in injects {
        inject(service, provider)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting;

    impl Capability for Greeting {
        type Value = String;
        const NAME: &'static str = "greeting";
    }

    struct Volume;

    impl Capability for Volume {
        type Value = u8;
        const NAME: &'static str = "volume";
    }

    #[derive(Default)]
    struct Listener {
        greeting: Slot<Greeting>,
    }

    impl Consumer for Listener {
        fn slot(&mut self, capability: TypeId) -> Option<&mut dyn Any> {
            self.greeting.claim(capability)
        }
    }

    struct Speaker;

    impl Provider for Speaker {
        fn provide(&self, capability: TypeId) -> Option<Box<dyn Any + Send>> {
            offer::<Greeting>(capability, || "hello".to_string())
        }
    }

    struct Silent;

    impl Provider for Silent {
        fn provide(&self, _: TypeId) -> Option<Box<dyn Any + Send>> {
            None
        }
    }

    /// Claims the greeting slot for the volume capability.
    struct Confused {
        greeting: Slot<Greeting>,
    }

    impl Consumer for Confused {
        fn slot(&mut self, capability: TypeId) -> Option<&mut dyn Any> {
            if capability == Volume::id() {
                Some(&mut self.greeting as &mut dyn Any)
            } else {
                None
            }
        }
    }

    #[test]
    fn injects_provided_value() {
        let mut listener = Listener::default();
        inject_capability::<Greeting>(&mut listener, &Speaker).unwrap();
        assert_eq!(listener.greeting.get().unwrap(), "hello");
    }

    #[test]
    fn not_needed_is_checked_first() {
        let mut listener = Listener::default();
        let err = inject_capability::<Volume>(&mut listener, &Silent).unwrap_err();
        assert!(matches!(err, InjectError::NotNeeded { capability: "volume" }));
    }

    #[test]
    fn not_provided() {
        let mut listener = Listener::default();
        let err = inject_capability::<Greeting>(&mut listener, &Silent).unwrap_err();
        assert!(matches!(err, InjectError::NotProvided { capability: "greeting" }));
        assert!(!listener.greeting.is_set());
    }

    #[test]
    fn slot_of_wrong_type() {
        let mut confused = Confused { greeting: Slot::default() };
        let err = inject_capability::<Volume>(&mut confused, &Speaker).unwrap_err();
        assert!(matches!(err, InjectError::SlotMismatch { .. }));
    }

    fn rename(consumer: &mut dyn Consumer, _: &dyn Provider) -> Result<(), InjectError> {
        let (slot, _) = validate_arg_interfaces::<Greeting>(consumer, &Speaker)?;
        slot.set("renamed".to_string());
        Ok(())
    }

    fn fail(_: &mut dyn Consumer, _: &dyn Provider) -> Result<(), InjectError> {
        Err(InjectError::NotProvided { capability: "failing" })
    }

    #[test]
    fn inject_with_runs_in_order() {
        let mut listener = Listener::default();
        inject_service_with(&mut listener, &Speaker, &[inject_capability::<Greeting>, rename]).unwrap();
        assert_eq!(listener.greeting.get().unwrap(), "renamed");
    }

    #[test]
    fn inject_with_stops_at_first_error() {
        let mut listener = Listener::default();
        let err = inject_service_with(&mut listener, &Speaker, &[fail, inject_capability::<Greeting>])
            .unwrap_err();
        assert!(matches!(err, InjectError::NotProvided { capability: "failing" }));
        assert!(!listener.greeting.is_set());
    }
}

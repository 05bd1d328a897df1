use tracing::Span;

use crate::lifecycle::{inject_capability, Capability, Consumer, InjectError, Provider};

/// Parent span the service logs under.
pub struct Logger;

impl Capability for Logger {
    type Value = Span;
    const NAME: &'static str = "logger";
}

pub fn inject(consumer: &mut dyn Consumer, provider: &dyn Provider) -> Result<(), InjectError> {
    inject_capability::<Logger>(consumer, provider)
}

use std::sync::Arc;

use configs::AppConfig;

use crate::lifecycle::{inject_capability, Capability, Consumer, InjectError, Provider};

/// Loaded application configuration.
pub struct Config;

impl Capability for Config {
    type Value = Arc<AppConfig>;
    const NAME: &'static str = "configuration";
}

pub fn inject(consumer: &mut dyn Consumer, provider: &dyn Provider) -> Result<(), InjectError> {
    inject_capability::<Config>(consumer, provider)
}

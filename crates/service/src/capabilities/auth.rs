use crate::auth::AuthService;
use crate::lifecycle::{inject_capability, Capability, Consumer, InjectError, Provider};

/// Password and token operations, exported by the auth service once it is ready.
pub struct Authentication;

impl Capability for Authentication {
    type Value = AuthService;
    const NAME: &'static str = "authentication";
}

pub fn inject(consumer: &mut dyn Consumer, provider: &dyn Provider) -> Result<(), InjectError> {
    inject_capability::<Authentication>(consumer, provider)
}

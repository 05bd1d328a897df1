use sea_orm::DatabaseConnection;

use crate::lifecycle::{inject_capability, Capability, Consumer, InjectError, Provider};

/// Shared database handle. `Disconnected` when no database is configured.
pub struct Storage;

impl Capability for Storage {
    type Value = DatabaseConnection;
    const NAME: &'static str = "storage";
}

pub fn inject(consumer: &mut dyn Consumer, provider: &dyn Provider) -> Result<(), InjectError> {
    inject_capability::<Storage>(consumer, provider)
}

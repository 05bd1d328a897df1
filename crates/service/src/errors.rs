use std::error::Error as StdError;

use thiserror::Error;

use crate::auth::errors::AuthError;
use crate::lifecycle::{InitError, InjectError, LookupError};

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Closed set of failure kinds, independent of which error type carries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CyclicDependency,
    MissingDefinition,
    DuplicateDefinition,
    AlreadyInitialized,
    CapabilityNotRequired,
    CapabilityNotProvided,
    MissingService,
    InvalidServiceType,
    InvalidPrivateKeySize,
    MissingKey,
    Unauthorized,
    MalformedToken,
    NotFound,
    Conflict,
    Validation,
    Storage,
    Internal,
}

/// Errors of the domain services (users, wishes).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Db(_) => ErrorKind::Storage,
            ServiceError::Auth(err) => err.kind(),
            ServiceError::Lookup(err) => err.kind(),
        }
    }
}

impl InitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InitError::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            InitError::MissingDefinition { .. } => ErrorKind::MissingDefinition,
            InitError::DuplicateDefinition { .. } => ErrorKind::DuplicateDefinition,
            InitError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            InitError::Service { source, .. } => kind_of(source.as_ref()),
        }
    }
}

impl InjectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InjectError::NotNeeded { .. } => ErrorKind::CapabilityNotRequired,
            InjectError::NotProvided { .. } | InjectError::SlotMismatch { .. } => {
                ErrorKind::CapabilityNotProvided
            }
        }
    }
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::MissingService(_) => ErrorKind::MissingService,
            LookupError::InvalidType { .. } => ErrorKind::InvalidServiceType,
        }
    }
}

/// Classifies an arbitrary error by walking its `source()` chain until a
/// known error type is found.
pub fn kind_of(err: &(dyn StdError + 'static)) -> ErrorKind {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(err) = err.downcast_ref::<InitError>() {
            return err.kind();
        }
        if let Some(err) = err.downcast_ref::<InjectError>() {
            return err.kind();
        }
        if let Some(err) = err.downcast_ref::<LookupError>() {
            return err.kind();
        }
        if let Some(err) = err.downcast_ref::<AuthError>() {
            return err.kind();
        }
        if let Some(err) = err.downcast_ref::<ServiceError>() {
            return err.kind();
        }
        current = err.source();
    }
    ErrorKind::Internal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::Denial;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] AuthError);

    #[test]
    fn kind_found_through_source_chain() {
        let err = Outer(AuthError::Unauthorized(Denial::InvalidPassword));
        assert_eq!(kind_of(&err), ErrorKind::Unauthorized);
    }

    #[test]
    fn unknown_errors_are_internal() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(kind_of(&err), ErrorKind::Internal);
    }

    #[test]
    fn boxed_init_failure_keeps_kind() {
        let err = InitError::Service {
            id: "users".into(),
            source: Box::new(InjectError::NotNeeded { capability: "storage" }),
        };
        assert_eq!(err.kind(), ErrorKind::CapabilityNotRequired);
    }
}

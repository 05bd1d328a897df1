use std::path::PathBuf;

use jsonwebtoken::errors::Error as JwtError;
use thiserror::Error;

use crate::errors::ErrorKind;

/// Reasons a caller is refused.
#[derive(Debug, Error)]
pub enum Denial {
    #[error("invalid password")]
    InvalidPassword,
    #[error("unexpected signing method: {0}")]
    UnexpectedSignMethod(String),
    #[error("missing bearer token")]
    MissingBearer,
    #[error("token rejected: {0}")]
    Token(#[source] JwtError),
}

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no key to hash passwords with")]
    MissingKey,
    #[error("invalid private key size: expected {expected} bytes, got {actual}")]
    InvalidPrivateKeySize { expected: usize, actual: usize },
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("private key is not valid hex: {0}")]
    MalformedKey(#[from] hex::FromHexError),
    #[error("error accessing key file {}: {source}", .path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored password digest is not valid hex")]
    MalformedDigest,
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] Denial),
    #[error("error processing token: {0}")]
    Token(#[source] JwtError),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Unauthorized(_) => 1004,
            AuthError::MissingKey => 1101,
            AuthError::InvalidPrivateKeySize { .. } => 1102,
            AuthError::InvalidKey(_) => 1103,
            AuthError::MalformedKey(_) => 1104,
            AuthError::KeyFile { .. } => 1105,
            AuthError::MalformedDigest => 1106,
            AuthError::Token(_) => 1201,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthError::MissingKey => ErrorKind::MissingKey,
            AuthError::InvalidPrivateKeySize { .. } => ErrorKind::InvalidPrivateKeySize,
            AuthError::Token(_) => ErrorKind::MalformedToken,
            AuthError::InvalidKey(_)
            | AuthError::MalformedKey(_)
            | AuthError::KeyFile { .. }
            | AuthError::MalformedDigest => ErrorKind::Internal,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthError::Unauthorized(_))
    }
}

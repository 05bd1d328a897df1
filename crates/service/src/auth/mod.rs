//! Auth module: key material, password digests, signed tokens and the
//! service exposing them to the rest of the application.

pub mod bearer;
pub mod domain;
pub mod errors;
pub mod keys;
pub mod password;
pub mod service;
pub mod token;

pub use bearer::{bearer_token, username_from_bearer};
pub use domain::Claims;
pub use errors::{AuthError, Denial};
pub use keys::{PrivateKey, PublicKey, PRIVATE_KEY_SIZE};
pub use service::{AuthService, AUTH_SERVICE};

//! Service layer of the wishlist backend.
//! - `lifecycle`: service definitions, dependency-ordered initialization and
//!   capability injection.
//! - `auth`, `users` and `wishes`: the services themselves.
//! - `state`: the application state every service is initialized against.

pub mod auth;
pub mod capabilities;
pub mod errors;
pub mod lifecycle;
pub mod state;
pub mod users;
pub mod wishes;

pub use errors::{BoxError, ErrorKind, ServiceError};
pub use state::AppState;

//! Capabilities a service can request during initialization.
//!
//! Each submodule holds one marker type and the `inject` function a service
//! lists to receive it.

pub mod auth;
pub mod config;
pub mod logger;
pub mod storage;

pub use auth::Authentication;
pub use config::Config;
pub use logger::Logger;
pub use storage::Storage;

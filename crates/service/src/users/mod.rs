//! Users module: domain, repository (in-memory and SeaORM) and the service
//! registering wishers and issuing their tokens.

pub mod domain;
pub mod entity;
pub mod repo;
pub mod repository;
pub mod service;

pub use service::{UsersService, USERS_SERVICE};

//! Wishes module: wishlists owned by wishers and the wishes inside them.

pub mod domain;
pub mod entity;
pub mod repo;
pub mod repository;
pub mod service;

pub use domain::Visibility;
pub use service::{WishesService, WISHES_SERVICE};

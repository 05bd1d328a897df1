use async_trait::async_trait;

use super::domain::User;
use crate::errors::ServiceError;

/// Repository abstraction for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError>;
    /// Stores `user`; `Conflict` if the username is taken.
    async fn insert(&self, user: User) -> Result<User, ServiceError>;
}

/// In-memory repository for tests and runs without a database
pub mod memory {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryUserRepository {
        users: Mutex<HashMap<String, User>>, // key: username
    }

    #[async_trait]
    impl UserRepository for InMemoryUserRepository {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
            Ok(self.users.lock().get(username).cloned())
        }

        async fn insert(&self, user: User) -> Result<User, ServiceError> {
            let mut users = self.users.lock();
            if users.contains_key(&user.username) {
                return Err(ServiceError::Conflict(format!("user {} already exists", user.username)));
            }
            users.insert(user.username.clone(), user.clone());
            Ok(user)
        }
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{Visibility, WishRecord, WishlistRecord};
use crate::errors::ServiceError;

/// Repository abstraction for wishlists and wishes.
///
/// Listings come back ordered by position.
#[async_trait]
pub trait WishRepository: Send + Sync {
    async fn find_wishlist(&self, wisher: Uuid, name: &str) -> Result<Option<WishlistRecord>, ServiceError>;
    async fn list_wishlists(&self, wisher: Uuid) -> Result<Vec<WishlistRecord>, ServiceError>;
    /// Appends after the wisher's last wishlist; `Conflict` if the name is taken.
    async fn insert_wishlist(
        &self,
        wisher: Uuid,
        name: &str,
        visibility: Visibility,
    ) -> Result<WishlistRecord, ServiceError>;
    /// Removes the wishlist and its wishes. Deleting a missing wishlist is not an error.
    async fn delete_wishlist(&self, wisher: Uuid, name: &str) -> Result<(), ServiceError>;
    /// `NotFound` if the wishlist does not exist.
    async fn insert_wish(&self, wishlist: Uuid, description: &str, position: i32) -> Result<Uuid, ServiceError>;
    async fn list_wishes(&self, wishlist: Uuid) -> Result<Vec<WishRecord>, ServiceError>;
}

/// In-memory repository for tests and runs without a database
pub mod memory {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Tables {
        wishlists: Vec<WishlistRecord>,
        wishes: Vec<WishRecord>,
    }

    #[derive(Default)]
    pub struct InMemoryWishRepository {
        tables: Mutex<Tables>,
    }

    #[async_trait]
    impl WishRepository for InMemoryWishRepository {
        async fn find_wishlist(&self, wisher: Uuid, name: &str) -> Result<Option<WishlistRecord>, ServiceError> {
            Ok(self
                .tables
                .lock()
                .wishlists
                .iter()
                .find(|w| w.wisher_uuid == wisher && w.name == name)
                .cloned())
        }

        async fn list_wishlists(&self, wisher: Uuid) -> Result<Vec<WishlistRecord>, ServiceError> {
            let mut found: Vec<_> = self
                .tables
                .lock()
                .wishlists
                .iter()
                .filter(|w| w.wisher_uuid == wisher)
                .cloned()
                .collect();
            found.sort_by_key(|w| w.position);
            Ok(found)
        }

        async fn insert_wishlist(
            &self,
            wisher: Uuid,
            name: &str,
            visibility: Visibility,
        ) -> Result<WishlistRecord, ServiceError> {
            let mut tables = self.tables.lock();
            let owned = tables.wishlists.iter().filter(|w| w.wisher_uuid == wisher);
            if owned.clone().any(|w| w.name == name) {
                return Err(ServiceError::Conflict(format!("wishlist {name} already exists")));
            }
            let position = owned.map(|w| w.position + 1).max().unwrap_or(0);

            let record = WishlistRecord {
                uuid: Uuid::new_v4(),
                wisher_uuid: wisher,
                name: name.to_string(),
                visibility,
                position,
            };
            tables.wishlists.push(record.clone());
            Ok(record)
        }

        async fn delete_wishlist(&self, wisher: Uuid, name: &str) -> Result<(), ServiceError> {
            let mut tables = self.tables.lock();
            let Some(index) = tables
                .wishlists
                .iter()
                .position(|w| w.wisher_uuid == wisher && w.name == name)
            else {
                return Ok(());
            };
            let removed = tables.wishlists.remove(index);
            tables.wishes.retain(|w| w.wishlist_uuid != removed.uuid);
            Ok(())
        }

        async fn insert_wish(&self, wishlist: Uuid, description: &str, position: i32) -> Result<Uuid, ServiceError> {
            let mut tables = self.tables.lock();
            if !tables.wishlists.iter().any(|w| w.uuid == wishlist) {
                return Err(ServiceError::not_found("wishlist"));
            }
            let uuid = Uuid::new_v4();
            tables.wishes.push(WishRecord {
                uuid,
                wishlist_uuid: wishlist,
                description: description.to_string(),
                fulfilled: false,
                position,
            });
            Ok(uuid)
        }

        async fn list_wishes(&self, wishlist: Uuid) -> Result<Vec<WishRecord>, ServiceError> {
            let mut found: Vec<_> = self
                .tables
                .lock()
                .wishes
                .iter()
                .filter(|w| w.wishlist_uuid == wishlist)
                .cloned()
                .collect();
            found.sort_by_key(|w| w.position);
            Ok(found)
        }
    }
}

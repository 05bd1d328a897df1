use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::wishes::domain::{Visibility, WishRecord, WishlistRecord};
use crate::wishes::entity::{wish, wishlist};
use crate::wishes::repository::WishRepository;

pub struct SeaOrmWishRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmWishRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, wisher: Uuid, name: &str) -> Result<Option<wishlist::Model>, ServiceError> {
        wishlist::Entity::find()
            .filter(wishlist::Column::WisherUuid.eq(wisher))
            .filter(wishlist::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(db_error)
    }
}

fn db_error(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => ServiceError::Conflict(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => ServiceError::not_found("wishlist"),
        _ => ServiceError::Db(err.to_string()),
    }
}

#[async_trait::async_trait]
impl WishRepository for SeaOrmWishRepository {
    async fn find_wishlist(&self, wisher: Uuid, name: &str) -> Result<Option<WishlistRecord>, ServiceError> {
        self.find_model(wisher, name)
            .await?
            .map(WishlistRecord::try_from)
            .transpose()
    }

    async fn list_wishlists(&self, wisher: Uuid) -> Result<Vec<WishlistRecord>, ServiceError> {
        wishlist::Entity::find()
            .filter(wishlist::Column::WisherUuid.eq(wisher))
            .order_by_asc(wishlist::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(WishlistRecord::try_from)
            .collect()
    }

    async fn insert_wishlist(
        &self,
        wisher: Uuid,
        name: &str,
        visibility: Visibility,
    ) -> Result<WishlistRecord, ServiceError> {
        let last = wishlist::Entity::find()
            .filter(wishlist::Column::WisherUuid.eq(wisher))
            .order_by_desc(wishlist::Column::Position)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        let am = wishlist::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            wisher_uuid: Set(wisher),
            name: Set(name.to_string()),
            visibility: Set(visibility.as_str().to_string()),
            position: Set(last.map_or(0, |l| l.position + 1)),
        };
        let created = am.insert(&self.db).await.map_err(db_error)?;
        WishlistRecord::try_from(created)
    }

    async fn delete_wishlist(&self, wisher: Uuid, name: &str) -> Result<(), ServiceError> {
        let Some(found) = self.find_model(wisher, name).await? else {
            return Ok(());
        };
        wish::Entity::delete_many()
            .filter(wish::Column::WishlistUuid.eq(found.uuid))
            .exec(&self.db)
            .await
            .map_err(db_error)?;
        wishlist::Entity::delete_by_id(found.uuid)
            .exec(&self.db)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn insert_wish(&self, wishlist_uuid: Uuid, description: &str, position: i32) -> Result<Uuid, ServiceError> {
        let exists = wishlist::Entity::find_by_id(wishlist_uuid)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .is_some();
        if !exists {
            return Err(ServiceError::not_found("wishlist"));
        }

        let am = wish::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            wishlist_uuid: Set(wishlist_uuid),
            description: Set(description.to_string()),
            fulfilled: Set(false),
            position: Set(position),
        };
        let created = am.insert(&self.db).await.map_err(db_error)?;
        Ok(created.uuid)
    }

    async fn list_wishes(&self, wishlist_uuid: Uuid) -> Result<Vec<WishRecord>, ServiceError> {
        let found = wish::Entity::find()
            .filter(wish::Column::WishlistUuid.eq(wishlist_uuid))
            .order_by_asc(wish::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(found.into_iter().map(WishRecord::from).collect())
    }
}

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr};

use crate::errors::ServiceError;
use crate::users::domain::User;
use crate::users::entity;
use crate::users::repository::UserRepository;

pub struct SeaOrmUserRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_error(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => ServiceError::Conflict(detail),
        _ => ServiceError::Db(err.to_string()),
    }
}

#[async_trait::async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let found = entity::Entity::find()
            .filter(entity::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(found.map(User::from))
    }

    async fn insert(&self, user: User) -> Result<User, ServiceError> {
        let am = entity::ActiveModel {
            uuid: Set(user.uuid),
            username: Set(user.username),
            password: Set(user.password),
            full_name: Set(user.full_name),
        };
        let created = am.insert(&self.db).await.map_err(db_error)?;
        Ok(created.into())
    }
}

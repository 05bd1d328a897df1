//! SeaORM entities of the `wishlists` and `wishes` tables.

use std::str::FromStr;

use super::domain::{Visibility, WishRecord, WishlistRecord};
use crate::errors::ServiceError;

pub mod wishlist {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "wishlists")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub uuid: Uuid,
        pub wisher_uuid: Uuid,
        pub name: String,
        pub visibility: String,
        pub position: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod wish {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "wishes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub uuid: Uuid,
        pub wishlist_uuid: Uuid,
        pub description: String,
        pub fulfilled: bool,
        pub position: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl TryFrom<wishlist::Model> for WishlistRecord {
    type Error = ServiceError;

    fn try_from(model: wishlist::Model) -> Result<Self, Self::Error> {
        let visibility = Visibility::from_str(&model.visibility)
            .map_err(|_| ServiceError::Db(format!("stored visibility {:?} is invalid", model.visibility)))?;
        Ok(Self {
            uuid: model.uuid,
            wisher_uuid: model.wisher_uuid,
            name: model.name,
            visibility,
            position: model.position,
        })
    }
}

impl From<wish::Model> for WishRecord {
    fn from(model: wish::Model) -> Self {
        Self {
            uuid: model.uuid,
            wishlist_uuid: model.wishlist_uuid,
            description: model.description,
            fulfilled: model.fulfilled,
            position: model.position,
        }
    }
}

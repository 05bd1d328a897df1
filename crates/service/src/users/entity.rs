use sea_orm::entity::prelude::*;

/// Row of the `wishers` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wishers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for super::domain::User {
    fn from(model: Model) -> Self {
        Self {
            uuid: model.uuid,
            username: model.username,
            password: model.password,
            full_name: model.full_name,
        }
    }
}

use sea_orm::entity::prelude::*;

/// Key/value side table for member profile data. Keys are not unique per
/// user; the anonymization flow collapses all rows for a user into a single
/// `is_anonymized` sentinel.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_meta")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(indexed)]
    pub user_id: i32,

    pub meta_key: String,

    pub meta_value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

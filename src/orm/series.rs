//! SeaORM Entity for series table
//!
//! A series is a top-level authored work. Soft deletion is tracked with
//! `is_deleted`/`deleted_at`; rows imported from legacy data may carry a
//! NULL `is_deleted`, which reads as active.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[derive(Default)]
pub enum Category {
    #[sea_orm(string_value = "Tech")]
    Tech,
    #[sea_orm(string_value = "Life")]
    Life,
    #[sea_orm(string_value = "News")]
    News,
    #[sea_orm(string_value = "Story")]
    Story,
    #[sea_orm(string_value = "Other")]
    #[default]
    Other,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "series")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: Category,
    pub author_id: i32,
    pub is_deleted: Option<bool>,
    pub deleted_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Author,
    #[sea_orm(has_many = "super::episodes::Entity")]
    Episodes,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

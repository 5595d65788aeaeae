//! SeaORM Entity for reports table
//!
//! A report flags an episode for moderation. Resolved reports are removed
//! from the table rather than archived.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum Reason {
    #[sea_orm(string_value = "Inappropriate")]
    Inappropriate,
    #[sea_orm(string_value = "Spam")]
    Spam,
    #[sea_orm(string_value = "Broken")]
    Broken,
    #[sea_orm(string_value = "Other")]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[derive(Default)]
pub enum Status {
    #[sea_orm(string_value = "Pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub episode_id: i32,
    pub reporter_id: i32,
    pub reason: Reason,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    pub status: Status,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::episodes::Entity",
        from = "Column::EpisodeId",
        to = "super::episodes::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Episode,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReporterId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Reporter,
}

impl Related<super::episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Project update entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    #[sea_orm(string_value = "progress")]
    Progress,
    #[sea_orm(string_value = "milestone")]
    Milestone,
    #[sea_orm(string_value = "issue")]
    Issue,
    #[sea_orm(string_value = "financial")]
    Financial,
    #[sea_orm(string_value = "general")]
    General,
}

/// Only published updates count towards project metrics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_update")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub project_id: String,

    #[sea_orm(nullable)]
    pub author_id: Option<String>,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub update_type: UpdateType,

    #[sea_orm(indexed)]
    pub status: UpdateStatus,

    /// People reached by the work this update reports
    #[sea_orm(nullable)]
    pub people_impacted: Option<i32>,

    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub budget_spent: Option<Decimal>,

    /// Overall project progress claimed by this update (0-100)
    #[sea_orm(nullable)]
    pub progress_percentage: Option<i32>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Author,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

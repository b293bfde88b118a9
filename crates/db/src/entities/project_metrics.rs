//! Project metrics entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Derived snapshot of a project's impact. Exactly one row per project.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_metrics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub project_id: String,

    pub people_impacted: i32,

    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub budget_used: Decimal,

    pub progress_percentage: i32,

    pub total_milestones: i32,

    pub completed_milestones: i32,

    pub last_updated: DateTimeWithTimeZone,
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
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

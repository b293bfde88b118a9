//! Group permission entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One permission code granted to a group.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_permission")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub group_id: String,

    /// Permission code, e.g. `change_project`
    pub codename: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::permission_group::Entity",
        from = "Column::GroupId",
        to = "super::permission_group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::permission_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

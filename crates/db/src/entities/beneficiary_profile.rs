//! Beneficiary profile entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityLevel {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "beneficiary_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub full_name: String,

    #[sea_orm(nullable)]
    pub gender: Option<String>,

    #[sea_orm(nullable)]
    pub date_of_birth: Option<Date>,

    pub province: String,

    pub district: String,

    #[sea_orm(nullable)]
    pub community: Option<String>,

    #[sea_orm(default_value = 1)]
    pub family_size: i32,

    pub vulnerability_level: VulnerabilityLevel,

    #[sea_orm(indexed)]
    pub status: BeneficiaryStatus,

    #[sea_orm(indexed)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::beneficiary_need::Entity")]
    Needs,
    #[sea_orm(has_many = "super::beneficiary_project::Entity")]
    Projects,
}

impl Related<super::beneficiary_need::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Needs.def()
    }
}

impl Related<super::beneficiary_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

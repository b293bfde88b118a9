//! Donation entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "donation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Registered donor, if the donation was made while signed in
    #[sea_orm(nullable, indexed)]
    pub donor_id: Option<String>,

    pub donor_name: String,

    #[sea_orm(nullable)]
    pub donor_email: Option<String>,

    /// Hide the donor's identity in reports and exports
    #[sea_orm(default_value = false)]
    pub is_anonymous: bool,

    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,

    pub currency: String,

    #[sea_orm(nullable)]
    pub donation_method_id: Option<String>,

    #[sea_orm(nullable, indexed)]
    pub project_id: Option<String>,

    #[sea_orm(indexed)]
    pub status: DonationStatus,

    #[sea_orm(nullable)]
    pub purpose: Option<String>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Key used to recognise repeat donors within a period.
    #[must_use]
    pub fn donor_key(&self) -> Option<&str> {
        self.donor_id
            .as_deref()
            .or(self.donor_email.as_deref())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DonorId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Donor,
    #[sea_orm(
        belongs_to = "super::donation_method::Entity",
        from = "Column::DonationMethodId",
        to = "super::donation_method::Column::Id",
        on_delete = "SetNull"
    )]
    Method,
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "SetNull"
    )]
    Project,
}

impl Related<super::donation_method::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Method.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

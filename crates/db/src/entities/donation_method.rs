//! Donation method entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A payment channel offered to donors (bank transfer, M-Pesa, ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "donation_method")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Account number, IBAN, phone number and similar instructions
    #[sea_orm(column_type = "JsonBinary")]
    pub account_details: Json,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(default_value = 0)]
    pub display_order: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub email: String,

    #[sea_orm(nullable)]
    pub first_name: Option<String>,

    #[sea_orm(nullable)]
    pub last_name: Option<String>,

    /// Argon2 hash; NULL for accounts that cannot sign in with a password
    #[serde(skip_serializing)]
    #[sea_orm(nullable)]
    pub password_hash: Option<String>,

    /// Bearer token issued by the token exchange endpoint
    #[serde(skip_serializing)]
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Can use the administrative endpoints
    #[sea_orm(default_value = false)]
    pub is_staff: bool,

    /// Holds every permission regardless of group membership
    #[sea_orm(default_value = false)]
    pub is_superuser: bool,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub last_login: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Name shown in exports and notifications.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self.username.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

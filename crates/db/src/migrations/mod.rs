//! Database migrations.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_user_tables;
mod m20250601_000002_create_project_tables;
mod m20250601_000003_create_donation_tables;
mod m20250601_000004_create_community_tables;
mod m20250601_000005_create_partner_tables;
mod m20250601_000006_create_notification_table;
mod m20250601_000007_create_blog_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_user_tables::Migration),
            Box::new(m20250601_000002_create_project_tables::Migration),
            Box::new(m20250601_000003_create_donation_tables::Migration),
            Box::new(m20250601_000004_create_community_tables::Migration),
            Box::new(m20250601_000005_create_partner_tables::Migration),
            Box::new(m20250601_000006_create_notification_table::Migration),
            Box::new(m20250601_000007_create_blog_tables::Migration),
        ]
    }
}

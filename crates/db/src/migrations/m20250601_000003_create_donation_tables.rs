//! Create donation method and donation tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DonationMethod::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DonationMethod::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DonationMethod::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(DonationMethod::Description).text())
                    .col(
                        ColumnDef::new(DonationMethod::AccountDetails)
                            .json_binary()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(DonationMethod::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DonationMethod::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DonationMethod::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Donation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Donation::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Donation::DonorId).string_len(32))
                    .col(ColumnDef::new(Donation::DonorName).string_len(200).not_null())
                    .col(ColumnDef::new(Donation::DonorEmail).string_len(254))
                    .col(
                        ColumnDef::new(Donation::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Donation::Amount)
                            .decimal_len(14, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Donation::Currency)
                            .string_len(3)
                            .not_null()
                            .default("MZN"),
                    )
                    .col(ColumnDef::new(Donation::DonationMethodId).string_len(32))
                    .col(ColumnDef::new(Donation::ProjectId).string_len(32))
                    .col(
                        ColumnDef::new(Donation::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Donation::Purpose).string_len(300))
                    .col(
                        ColumnDef::new(Donation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donation_donor")
                            .from(Donation::Table, Donation::DonorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donation_method")
                            .from(Donation::Table, Donation::DonationMethodId)
                            .to(DonationMethod::Table, DonationMethod::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donation_project")
                            .from(Donation::Table, Donation::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) for period totals
        manager
            .create_index(
                Index::create()
                    .name("idx_donation_status_created_at")
                    .table(Donation::Table)
                    .col(Donation::Status)
                    .col(Donation::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Donation::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DonationMethod::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DonationMethod {
    Table,
    Id,
    Name,
    Description,
    AccountDetails,
    IsActive,
    DisplayOrder,
    CreatedAt,
}

#[derive(Iden)]
enum Donation {
    Table,
    Id,
    DonorId,
    DonorName,
    DonorEmail,
    IsAnonymous,
    Amount,
    Currency,
    DonationMethodId,
    ProjectId,
    Status,
    Purpose,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
}

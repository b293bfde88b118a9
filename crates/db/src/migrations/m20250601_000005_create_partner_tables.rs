//! Create partner, partner message and assignment tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Partner::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Partner::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Partner::UserId).string_len(32).unique_key())
                    .col(ColumnDef::new(Partner::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Partner::OrganizationType).string_len(100))
                    .col(
                        ColumnDef::new(Partner::ContactEmail)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Partner::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Partner::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_partner_user")
                            .from(Partner::Table, Partner::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PartnerMessage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PartnerMessage::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PartnerMessage::PartnerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerMessage::SenderId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerMessage::Subject)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PartnerMessage::Content).text().not_null())
                    .col(ColumnDef::new(PartnerMessage::ProjectId).string_len(32))
                    .col(
                        ColumnDef::new(PartnerMessage::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PartnerMessage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_partner_message_partner")
                            .from(PartnerMessage::Table, PartnerMessage::PartnerId)
                            .to(Partner::Table, Partner::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_partner_message_sender")
                            .from(PartnerMessage::Table, PartnerMessage::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PartnerProjectAssignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PartnerProjectAssignment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PartnerProjectAssignment::PartnerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerProjectAssignment::ProjectId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerProjectAssignment::Role)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PartnerProjectAssignment::Status)
                            .string_len(32)
                            .not_null()
                            .default("proposed"),
                    )
                    .col(ColumnDef::new(PartnerProjectAssignment::AssignedBy).string_len(32))
                    .col(
                        ColumnDef::new(PartnerProjectAssignment::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_partner_assignment_partner")
                            .from(
                                PartnerProjectAssignment::Table,
                                PartnerProjectAssignment::PartnerId,
                            )
                            .to(Partner::Table, Partner::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_partner_assignment_project")
                            .from(
                                PartnerProjectAssignment::Table,
                                PartnerProjectAssignment::ProjectId,
                            )
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PartnerProjectAssignment::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(PartnerMessage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Partner::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Partner {
    Table,
    Id,
    UserId,
    Name,
    OrganizationType,
    ContactEmail,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum PartnerMessage {
    Table,
    Id,
    PartnerId,
    SenderId,
    Subject,
    Content,
    ProjectId,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum PartnerProjectAssignment {
    Table,
    Id,
    PartnerId,
    ProjectId,
    Role,
    Status,
    AssignedBy,
    AssignedAt,
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

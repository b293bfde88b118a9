//! Create program, category, project, update, milestone and metrics tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Program::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Program::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Program::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Program::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Program::Description).text())
                    .col(
                        ColumnDef::new(Program::CreatedAt)
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
                    .table(ProjectCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectCategory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectCategory::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectCategory::Slug)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ProjectCategory::Color).string_len(7))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Project::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Project::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Project::ShortDescription).string_len(300))
                    .col(ColumnDef::new(Project::Description).text())
                    .col(
                        ColumnDef::new(Project::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Project::Priority)
                            .string_len(32)
                            .not_null()
                            .default("medium"),
                    )
                    .col(ColumnDef::new(Project::ProgramId).string_len(32))
                    .col(ColumnDef::new(Project::CategoryId).string_len(32))
                    .col(ColumnDef::new(Project::Location).string_len(200))
                    .col(
                        ColumnDef::new(Project::Budget)
                            .decimal_len(14, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Project::TargetBeneficiaries)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Project::StartDate).date())
                    .col(ColumnDef::new(Project::EndDate).date())
                    .col(
                        ColumnDef::new(Project::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Project::IsPublic)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Project::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_program")
                            .from(Project::Table, Project::ProgramId)
                            .to(Program::Table, Program::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_category")
                            .from(Project::Table, Project::CategoryId)
                            .to(ProjectCategory::Table, ProjectCategory::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_status")
                    .table(Project::Table)
                    .col(Project::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectUpdate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectUpdate::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectUpdate::ProjectId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProjectUpdate::AuthorId).string_len(32))
                    .col(
                        ColumnDef::new(ProjectUpdate::Title)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProjectUpdate::Description).text().not_null())
                    .col(
                        ColumnDef::new(ProjectUpdate::UpdateType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectUpdate::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(ProjectUpdate::PeopleImpacted).integer())
                    .col(ColumnDef::new(ProjectUpdate::BudgetSpent).decimal_len(14, 2))
                    .col(ColumnDef::new(ProjectUpdate::ProgressPercentage).integer())
                    .col(
                        ColumnDef::new(ProjectUpdate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_update_project")
                            .from(ProjectUpdate::Table, ProjectUpdate::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_update_author")
                            .from(ProjectUpdate::Table, ProjectUpdate::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (project_id, status) for metric recomputation
        manager
            .create_index(
                Index::create()
                    .name("idx_project_update_project_status")
                    .table(ProjectUpdate::Table)
                    .col(ProjectUpdate::ProjectId)
                    .col(ProjectUpdate::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectMilestone::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectMilestone::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectMilestone::ProjectId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectMilestone::Title)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProjectMilestone::Description).text())
                    .col(ColumnDef::new(ProjectMilestone::TargetDate).date().not_null())
                    .col(ColumnDef::new(ProjectMilestone::CompletedDate).date())
                    .col(
                        ColumnDef::new(ProjectMilestone::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ProjectMilestone::Progress)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectMilestone::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_milestone_project")
                            .from(ProjectMilestone::Table, ProjectMilestone::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_milestone_project_id")
                    .table(ProjectMilestone::Table)
                    .col(ProjectMilestone::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectMetrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectMetrics::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectMetrics::ProjectId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectMetrics::PeopleImpacted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectMetrics::BudgetUsed)
                            .decimal_len(14, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectMetrics::ProgressPercentage)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectMetrics::TotalMilestones)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectMetrics::CompletedMilestones)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProjectMetrics::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_metrics_project")
                            .from(ProjectMetrics::Table, ProjectMetrics::ProjectId)
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
            .drop_table(Table::drop().table(ProjectMetrics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectMilestone::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectUpdate::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProjectCategory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Program::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Program {
    Table,
    Id,
    Name,
    Slug,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum ProjectCategory {
    Table,
    Id,
    Name,
    Slug,
    Color,
}

#[derive(Iden)]
enum Project {
    Table,
    Id,
    Name,
    Slug,
    ShortDescription,
    Description,
    Status,
    Priority,
    ProgramId,
    CategoryId,
    Location,
    Budget,
    TargetBeneficiaries,
    StartDate,
    EndDate,
    IsFeatured,
    IsPublic,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProjectUpdate {
    Table,
    Id,
    ProjectId,
    AuthorId,
    Title,
    Description,
    UpdateType,
    Status,
    PeopleImpacted,
    BudgetSpent,
    ProgressPercentage,
    CreatedAt,
}

#[derive(Iden)]
enum ProjectMilestone {
    Table,
    Id,
    ProjectId,
    Title,
    Description,
    TargetDate,
    CompletedDate,
    Status,
    Progress,
    DisplayOrder,
}

#[derive(Iden)]
enum ProjectMetrics {
    Table,
    Id,
    ProjectId,
    PeopleImpacted,
    BudgetUsed,
    ProgressPercentage,
    TotalMilestones,
    CompletedMilestones,
    LastUpdated,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

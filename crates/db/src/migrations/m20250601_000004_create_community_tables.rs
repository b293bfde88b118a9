//! Create volunteer and beneficiary tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Skill::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Skill::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Skill::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Skill::Category).string_len(100))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VolunteerProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VolunteerProfile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::UserId)
                            .string_len(32)
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::FullName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::Email)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VolunteerProfile::Phone).string_len(32))
                    .col(ColumnDef::new(VolunteerProfile::Location).string_len(200))
                    .col(
                        ColumnDef::new(VolunteerProfile::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(VolunteerProfile::Availability).string_len(200))
                    .col(
                        ColumnDef::new(VolunteerProfile::TotalHours)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VolunteerProfile::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_volunteer_profile_user")
                            .from(VolunteerProfile::Table, VolunteerProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VolunteerSkill::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VolunteerSkill::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VolunteerSkill::VolunteerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VolunteerSkill::SkillId)
                            .string_len(32)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_volunteer_skill_volunteer")
                            .from(VolunteerSkill::Table, VolunteerSkill::VolunteerId)
                            .to(VolunteerProfile::Table, VolunteerProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_volunteer_skill_skill")
                            .from(VolunteerSkill::Table, VolunteerSkill::SkillId)
                            .to(Skill::Table, Skill::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Need::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Need::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Need::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Need::Category).string_len(100))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BeneficiaryProfile::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BeneficiaryProfile::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryProfile::FullName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BeneficiaryProfile::Gender).string_len(16))
                    .col(ColumnDef::new(BeneficiaryProfile::DateOfBirth).date())
                    .col(
                        ColumnDef::new(BeneficiaryProfile::Province)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryProfile::District)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BeneficiaryProfile::Community).string_len(100))
                    .col(
                        ColumnDef::new(BeneficiaryProfile::FamilySize)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryProfile::VulnerabilityLevel)
                            .string_len(32)
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryProfile::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryProfile::CreatedAt)
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
                    .table(BeneficiaryNeed::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BeneficiaryNeed::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryNeed::BeneficiaryId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryNeed::NeedId)
                            .string_len(32)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_beneficiary_need_beneficiary")
                            .from(BeneficiaryNeed::Table, BeneficiaryNeed::BeneficiaryId)
                            .to(BeneficiaryProfile::Table, BeneficiaryProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_beneficiary_need_need")
                            .from(BeneficiaryNeed::Table, BeneficiaryNeed::NeedId)
                            .to(Need::Table, Need::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BeneficiaryProject::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BeneficiaryProject::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryProject::BeneficiaryId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryProject::ProjectId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BeneficiaryProject::EnrolledAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_beneficiary_project_beneficiary")
                            .from(BeneficiaryProject::Table, BeneficiaryProject::BeneficiaryId)
                            .to(BeneficiaryProfile::Table, BeneficiaryProfile::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_beneficiary_project_project")
                            .from(BeneficiaryProject::Table, BeneficiaryProject::ProjectId)
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
            .drop_table(Table::drop().table(BeneficiaryProject::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BeneficiaryNeed::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BeneficiaryProfile::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Need::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VolunteerSkill::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VolunteerProfile::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Skill::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Skill {
    Table,
    Id,
    Name,
    Category,
}

#[derive(Iden)]
enum VolunteerProfile {
    Table,
    Id,
    UserId,
    FullName,
    Email,
    Phone,
    Location,
    Status,
    Availability,
    TotalHours,
    CreatedAt,
}

#[derive(Iden)]
enum VolunteerSkill {
    Table,
    Id,
    VolunteerId,
    SkillId,
}

#[derive(Iden)]
enum Need {
    Table,
    Id,
    Name,
    Category,
}

#[derive(Iden)]
enum BeneficiaryProfile {
    Table,
    Id,
    FullName,
    Gender,
    DateOfBirth,
    Province,
    District,
    Community,
    FamilySize,
    VulnerabilityLevel,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum BeneficiaryNeed {
    Table,
    Id,
    BeneficiaryId,
    NeedId,
}

#[derive(Iden)]
enum BeneficiaryProject {
    Table,
    Id,
    BeneficiaryId,
    ProjectId,
    EnrolledAt,
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

//! Create blog post and comment tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlogPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlogPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BlogPost::Title).string_len(200).not_null())
                    .col(
                        ColumnDef::new(BlogPost::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(BlogPost::Excerpt).string_len(500))
                    .col(ColumnDef::new(BlogPost::Content).text().not_null())
                    .col(
                        ColumnDef::new(BlogPost::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(BlogPost::AuthorId).string_len(32))
                    .col(ColumnDef::new(BlogPost::MetaTitle).string_len(200))
                    .col(ColumnDef::new(BlogPost::MetaDescription).string_len(300))
                    .col(ColumnDef::new(BlogPost::PublishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(BlogPost::ViewsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BlogPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(BlogPost::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blog_post_author")
                            .from(BlogPost::Table, BlogPost::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_blog_post_status_published_at")
                    .table(BlogPost::Table)
                    .col(BlogPost::Status)
                    .col(BlogPost::PublishedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(Comment::AuthorName).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Comment::AuthorEmail)
                            .string_len(254)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Comment::Content).text().not_null())
                    .col(
                        ColumnDef::new(Comment::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Comment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_post")
                            .from(Comment::Table, Comment::PostId)
                            .to(BlogPost::Table, BlogPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BlogPost::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BlogPost {
    Table,
    Id,
    Title,
    Slug,
    Excerpt,
    Content,
    Status,
    AuthorId,
    MetaTitle,
    MetaDescription,
    PublishedAt,
    ViewsCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
    PostId,
    AuthorName,
    AuthorEmail,
    Content,
    IsApproved,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

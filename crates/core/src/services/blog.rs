//! Blog posts and moderated comments.

use chrono::Utc;
use mozsolidaria_common::{AppError, AppResult, IdGenerator, slugify};
use mozsolidaria_db::{
    entities::{
        blog_post::{self, PostStatus},
        comment,
    },
    repositories::BlogRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    pub status: Option<PostStatus>,
    #[validate(length(max = 60))]
    pub meta_title: Option<String>,
    #[validate(length(max = 160))]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCommentInput {
    #[validate(length(min = 1, max = 100))]
    pub author_name: String,
    #[validate(email)]
    pub author_email: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Blog service for business logic.
#[derive(Clone)]
pub struct BlogService {
    blog_repo: BlogRepository,
    id_gen: IdGenerator,
}

impl BlogService {
    /// Create a new blog service.
    #[must_use]
    pub const fn new(blog_repo: BlogRepository) -> Self {
        Self {
            blog_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Published posts, most recent first.
    pub async fn list_published(&self, limit: u64, offset: u64) -> AppResult<Vec<blog_post::Model>> {
        self.blog_repo
            .find_published(limit.clamp(1, 100), offset)
            .await
    }

    async fn published_post(&self, slug: &str) -> AppResult<blog_post::Model> {
        self.blog_repo
            .find_post_by_slug(slug)
            .await?
            .filter(|p| p.status == PostStatus::Published)
            .ok_or_else(|| AppError::NotFound(format!("post {slug}")))
    }

    /// A published post. Each read counts as a view.
    pub async fn read_post(&self, slug: &str) -> AppResult<blog_post::Model> {
        let post = self.published_post(slug).await?;
        self.blog_repo.record_view(post).await
    }

    /// Create a post; publishing stamps `published_at`.
    pub async fn create_post(
        &self,
        author_id: &str,
        input: CreatePostInput,
    ) -> AppResult<blog_post::Model> {
        input.validate()?;
        let slug = slugify(input.slug.as_deref().unwrap_or(&input.title));
        if slug.is_empty() {
            return Err(AppError::Validation(
                "slug must contain at least one letter or digit".to_string(),
            ));
        }
        if self.blog_repo.find_post_by_slug(&slug).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "a post with slug '{slug}' already exists"
            )));
        }

        let status = input.status.unwrap_or(PostStatus::Draft);
        let now = Utc::now();
        let model = blog_post::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            slug: Set(slug),
            excerpt: Set(input.excerpt),
            content: Set(input.content),
            status: Set(status),
            author_id: Set(Some(author_id.to_string())),
            meta_title: Set(input.meta_title),
            meta_description: Set(input.meta_description),
            published_at: Set((status == PostStatus::Published).then(|| now.into())),
            views_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let created = self.blog_repo.create_post(model).await?;
        info!(post_id = %created.id, slug = %created.slug, "Blog post created");
        Ok(created)
    }

    /// Approved comments of a published post.
    pub async fn list_comments(&self, slug: &str) -> AppResult<Vec<comment::Model>> {
        let post = self.published_post(slug).await?;
        self.blog_repo.find_approved_comments(&post.id).await
    }

    /// Submit a comment. It stays hidden until approved.
    pub async fn add_comment(&self, slug: &str, input: AddCommentInput) -> AppResult<comment::Model> {
        input.validate()?;
        let post = self.published_post(slug).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_name: Set(input.author_name),
            author_email: Set(input.author_email),
            content: Set(input.content),
            is_approved: Set(false),
            created_at: Set(Utc::now().into()),
        };

        self.blog_repo.create_comment(model).await
    }

    /// Make a comment publicly visible.
    pub async fn approve_comment(&self, comment_id: &str) -> AppResult<comment::Model> {
        let found = self
            .blog_repo
            .find_comment_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {comment_id}")))?;

        if found.is_approved {
            return Ok(found);
        }

        self.blog_repo.approve_comment(found).await
    }
}

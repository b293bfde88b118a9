//! Blog repository.

use std::sync::Arc;

use super::TimeWindow;
use crate::entities::{BlogPost, Comment, blog_post, blog_post::PostStatus, comment};
use mozsolidaria_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// Blog posts and comments.
#[derive(Clone)]
pub struct BlogRepository {
    db: Arc<DatabaseConnection>,
}

impl BlogRepository {
    /// Create a new blog repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // === Posts ===

    /// Find a post by slug.
    pub async fn find_post_by_slug(&self, slug: &str) -> AppResult<Option<blog_post::Model>> {
        BlogPost::find()
            .filter(blog_post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Published posts, most recent first.
    pub async fn find_published(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<blog_post::Model>> {
        BlogPost::find()
            .filter(blog_post::Column::Status.eq(PostStatus::Published))
            .order_by_desc(blog_post::Column::PublishedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts for exports, newest first.
    pub async fn find_filtered(
        &self,
        status: Option<PostStatus>,
        window: TimeWindow,
    ) -> AppResult<Vec<blog_post::Model>> {
        let mut query = BlogPost::find().order_by_desc(blog_post::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(blog_post::Column::Status.eq(status));
        }

        window
            .apply(query, blog_post::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a post.
    pub async fn create_post(&self, model: blog_post::ActiveModel) -> AppResult<blog_post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bump the view counter of a post.
    pub async fn record_view(&self, post: blog_post::Model) -> AppResult<blog_post::Model> {
        let views = post.views_count.saturating_add(1);
        let mut active: blog_post::ActiveModel = post.into();
        active.views_count = Set(views);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Comments ===

    /// Find a comment by ID.
    pub async fn find_comment_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved comments of a post, oldest first.
    pub async fn find_approved_comments(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::IsApproved.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every comment of the given posts.
    pub async fn find_comments_for_posts(
        &self,
        post_ids: &[String],
    ) -> AppResult<Vec<comment::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a comment.
    pub async fn create_comment(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Make a comment publicly visible.
    pub async fn approve_comment(&self, model: comment::Model) -> AppResult<comment::Model> {
        let mut active: comment::ActiveModel = model.into();
        active.is_approved = Set(true);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_approved_comments() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::comment("c1", "post1", true)]])
                .into_connection(),
        );

        let repo = BlogRepository::new(db);
        let comments = repo.find_approved_comments("post1").await.unwrap();

        assert_eq!(comments.len(), 1);
        assert!(comments[0].is_approved);
    }

    #[tokio::test]
    async fn test_record_view_increments() {
        let post = test_utils::blog_post("post1", "agua-limpa");
        let viewed = blog_post::Model {
            views_count: 1,
            ..post.clone()
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[viewed]])
                .into_connection(),
        );

        let repo = BlogRepository::new(db);
        let updated = repo.record_view(post).await.unwrap();

        assert_eq!(updated.views_count, 1);
    }
}

//! The store seam. Handlers only ever see `Arc<dyn Store>`.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Author, Category, CategoryChanges, Comment, Post, PostChanges, User};
use crate::query::{Pagination, PostFilter};

#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("Duplicate value: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn from_write(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or("unique index").to_string())
            }
            _ => StoreError::Database(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    // users
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Batch lookup; unknown ids are simply absent from the result.
    async fn find_authors(&self, ids: &[Uuid]) -> StoreResult<Vec<Author>>;

    // categories
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn count_categories(&self) -> StoreResult<u64>;
    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>>;
    async fn find_category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>>;
    async fn find_categories(&self, ids: &[Uuid]) -> StoreResult<Vec<Category>>;
    async fn insert_category(&self, category: &Category) -> StoreResult<()>;
    async fn update_category(
        &self,
        id: Uuid,
        changes: &CategoryChanges,
    ) -> StoreResult<Option<Category>>;
    async fn delete_category(&self, id: Uuid) -> StoreResult<bool>;

    // posts
    async fn count_posts(&self, filter: &PostFilter) -> StoreResult<u64>;
    /// One page, newest first.
    async fn find_posts(&self, filter: &PostFilter, page: Pagination) -> StoreResult<Vec<Post>>;
    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>>;
    async fn find_post_by_slug(&self, slug: &str) -> StoreResult<Option<Post>>;
    async fn insert_post(&self, post: &Post) -> StoreResult<()>;
    async fn update_post(&self, id: Uuid, changes: &PostChanges) -> StoreResult<Option<Post>>;
    async fn delete_post(&self, id: Uuid) -> StoreResult<bool>;

    // comments
    /// Comments of one post, newest first.
    async fn list_comments(&self, post_id: Uuid) -> StoreResult<Vec<Comment>>;
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;
}

//! In-memory [`Store`] for handler tests. Enforces the same unique keys as
//! the SQL schema and counts batch lookups.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::models::{Author, Category, CategoryChanges, Comment, Post, PostChanges, User};
use super::store::{Store, StoreError, StoreResult};
use crate::query::{Pagination, PostFilter};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    category_batches: AtomicUsize,
    author_batches: AtomicUsize,
    post_pages: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category_batches(&self) -> usize {
        self.category_batches.load(Ordering::SeqCst)
    }

    pub fn author_batches(&self) -> usize {
        self.author_batches.load(Ordering::SeqCst)
    }

    pub fn post_pages(&self) -> usize {
        self.post_pages.load(Ordering::SeqCst)
    }

    pub fn post_count(&self) -> usize {
        self.tables.lock().unwrap().posts.len()
    }

    pub fn category_count(&self) -> usize {
        self.tables.lock().unwrap().categories.len()
    }

    pub fn comment_count(&self) -> usize {
        self.tables.lock().unwrap().comments.len()
    }

    /// Shifts a post's creation time into the past.
    pub fn backdate_post(&self, id: Uuid, by: chrono::Duration) {
        if let Some(post) = self.tables.lock().unwrap().posts.get_mut(&id) {
            post.created_at -= by;
        }
    }

    pub fn backdate_comment(&self, id: Uuid, by: chrono::Duration) {
        if let Some(comment) = self.tables.lock().unwrap().comments.get_mut(&id) {
            comment.created_at -= by;
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches(filter: &PostFilter, post: &Post) -> bool {
    if filter.published_only && !post.published {
        return false;
    }
    if let Some(text) = &filter.text {
        if !(contains_ci(&post.title, text)
            || contains_ci(&post.excerpt, text)
            || contains_ci(&post.content, text))
        {
            return false;
        }
    }
    if let Some(author) = filter.author {
        if post.author_id != author {
            return false;
        }
    }
    if let Some(slug) = &filter.slug {
        if post.slug.to_lowercase() != slug.to_lowercase() {
            return false;
        }
    }
    true
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("idx_users_email".to_string()));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_authors(&self, ids: &[Uuid]) -> StoreResult<Vec<Author>> {
        self.author_batches.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| t.users.get(id))
            .map(|u| Author {
                id: u.id,
                name: u.name.clone(),
            })
            .collect())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.tables.lock().unwrap().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn count_categories(&self) -> StoreResult<u64> {
        Ok(self.tables.lock().unwrap().categories.len() as u64)
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.tables.lock().unwrap().categories.get(&id).cloned())
    }

    async fn find_category_by_slug(&self, slug: &str) -> StoreResult<Option<Category>> {
        let t = self.tables.lock().unwrap();
        Ok(t.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn find_categories(&self, ids: &[Uuid]) -> StoreResult<Vec<Category>> {
        self.category_batches.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().unwrap();
        Ok(ids.iter().filter_map(|id| t.categories.get(id)).cloned().collect())
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        if t.categories.values().any(|c| c.slug == category.slug) {
            return Err(StoreError::Conflict("idx_categories_slug".to_string()));
        }
        t.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: &CategoryChanges,
    ) -> StoreResult<Option<Category>> {
        let mut t = self.tables.lock().unwrap();
        if let Some(slug) = &changes.slug {
            if t.categories.values().any(|c| c.id != id && &c.slug == slug) {
                return Err(StoreError::Conflict("idx_categories_slug".to_string()));
            }
        }
        let Some(category) = t.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            category.name = name.clone();
        }
        if let Some(slug) = &changes.slug {
            category.slug = slug.clone();
        }
        category.updated_at = changes.updated_at;
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.lock().unwrap().categories.remove(&id).is_some())
    }

    async fn count_posts(&self, filter: &PostFilter) -> StoreResult<u64> {
        let t = self.tables.lock().unwrap();
        Ok(t.posts.values().filter(|p| matches(filter, p)).count() as u64)
    }

    async fn find_posts(&self, filter: &PostFilter, page: Pagination) -> StoreResult<Vec<Post>> {
        self.post_pages.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.lock().unwrap();
        let mut posts: Vec<Post> = t
            .posts
            .values()
            .filter(|p| matches(filter, p))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        Ok(self.tables.lock().unwrap().posts.get(&id).cloned())
    }

    async fn find_post_by_slug(&self, slug: &str) -> StoreResult<Option<Post>> {
        let t = self.tables.lock().unwrap();
        Ok(t.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        if t.posts.values().any(|p| p.slug == post.slug) {
            return Err(StoreError::Conflict("idx_posts_slug".to_string()));
        }
        t.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn update_post(&self, id: Uuid, changes: &PostChanges) -> StoreResult<Option<Post>> {
        let mut t = self.tables.lock().unwrap();
        if let Some(slug) = &changes.slug {
            if t.posts.values().any(|p| p.id != id && &p.slug == slug) {
                return Err(StoreError::Conflict("idx_posts_slug".to_string()));
            }
        }
        let Some(post) = t.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            post.title = title.clone();
        }
        if let Some(slug) = &changes.slug {
            post.slug = slug.clone();
        }
        if let Some(excerpt) = &changes.excerpt {
            post.excerpt = excerpt.clone();
        }
        if let Some(content) = &changes.content {
            post.content = content.clone();
        }
        if let Some(banner_url) = &changes.banner_url {
            post.banner_url = banner_url.clone();
        }
        if let Some(category_id) = changes.category_id {
            post.category_id = category_id;
        }
        if let Some(published) = changes.published {
            post.published = published;
        }
        post.updated_at = changes.updated_at;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.lock().unwrap().posts.remove(&id).is_some())
    }

    async fn list_comments(&self, post_id: Uuid) -> StoreResult<Vec<Comment>> {
        let t = self.tables.lock().unwrap();
        let mut comments: Vec<Comment> = t
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.tables
            .lock()
            .unwrap()
            .comments
            .insert(comment.id, comment.clone());
        Ok(())
    }
}

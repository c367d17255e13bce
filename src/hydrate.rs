//! Reference hydration: swap stored foreign keys for small snapshots of the
//! entities they point at.
//!
//! A page of N items costs one batch lookup per referenced entity type, never
//! one lookup per item. Missing referents (deleted after the write) still
//! produce a reference object carrying the original id and no name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use uuid::Uuid;

use crate::db::models::{Author, Category, Comment, Post};
use crate::db::{Store, StoreResult};

/// Records addressable by id in a lookup table.
pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Category {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Author {
    fn key(&self) -> Uuid {
        self.id
    }
}

/// Deduplicates `keys`, fetches them with a single call to `fetch` and
/// indexes the result by id. No call is made for an empty key set.
pub async fn lookup<T, F, Fut>(
    keys: impl IntoIterator<Item = Uuid>,
    fetch: F,
) -> StoreResult<HashMap<Uuid, T>>
where
    T: Keyed,
    F: FnOnce(Vec<Uuid>) -> Fut,
    Fut: Future<Output = StoreResult<Vec<T>>>,
{
    let mut seen = HashSet::new();
    let ids: Vec<Uuid> = keys.into_iter().filter(|id| seen.insert(*id)).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let records = fetch(ids).await?;
    Ok(records.into_iter().map(|r| (r.key(), r)).collect())
}

// ============================================================================
// Reference snapshots
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CategoryRef {
    fn resolve(id: Uuid, category: Option<&Category>) -> Self {
        Self {
            id,
            name: category.map(|c| c.name.clone()),
            slug: category.map(|c| c.slug.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorRef {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AuthorRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    fn resolve(id: Uuid, author: Option<&Author>) -> Self {
        Self {
            id,
            name: author.map(|a| a.name.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    pub category: CategoryRef,
    pub author: AuthorRef,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    fn new(post: Post, category: CategoryRef, author: AuthorRef) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            content: post.content,
            banner_url: post.banner_url,
            category,
            author,
            published: post.published,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub post: Uuid,
    pub author: AuthorRef,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentView {
    pub fn new(comment: Comment, author: AuthorRef) -> Self {
        Self {
            id: comment.id,
            post: comment.post_id,
            author,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

// ============================================================================
// Hydration
// ============================================================================

/// Hydrates a page of posts: categories and authors are fetched concurrently.
pub async fn hydrate_posts(store: &dyn Store, posts: Vec<Post>) -> StoreResult<Vec<PostView>> {
    let category_ids = posts.iter().map(|p| p.category_id);
    let author_ids = posts.iter().map(|p| p.author_id);

    let (categories, authors) = tokio::try_join!(
        lookup(category_ids, |ids| async move { store.find_categories(&ids).await }),
        lookup(author_ids, |ids| async move { store.find_authors(&ids).await }),
    )?;

    Ok(posts
        .into_iter()
        .map(|p| {
            let category = CategoryRef::resolve(p.category_id, categories.get(&p.category_id));
            let author = AuthorRef::resolve(p.author_id, authors.get(&p.author_id));
            PostView::new(p, category, author)
        })
        .collect())
}

/// Hydrates a single post with two concurrent point lookups.
pub async fn hydrate_post(store: &dyn Store, post: Post) -> StoreResult<PostView> {
    let (category, author) = tokio::try_join!(
        store.find_category(post.category_id),
        store.find_user(post.author_id),
    )?;

    let category = CategoryRef::resolve(post.category_id, category.as_ref());
    let author = AuthorRef {
        id: post.author_id,
        name: author.map(|u| u.name),
    };
    Ok(PostView::new(post, category, author))
}

pub async fn hydrate_comments(
    store: &dyn Store,
    comments: Vec<Comment>,
) -> StoreResult<Vec<CommentView>> {
    let authors = lookup(comments.iter().map(|c| c.author_id), |ids| async move {
        store.find_authors(&ids).await
    })
    .await?;

    Ok(comments
        .into_iter()
        .map(|c| {
            let author = AuthorRef::resolve(c.author_id, authors.get(&c.author_id));
            CommentView::new(c, author)
        })
        .collect())
}

/**
 * Post Routes
 * Paginated listing with search, single post by slug, authoring and admin edits
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{nullable, parse_id, present, JsonBody, OkResponse};
use crate::content::{excerpt_from, sanitize_html};
use crate::db::models::{Post, PostChanges, User};
use crate::error::{ApiError, ApiResult};
use crate::hydrate::{hydrate_post, hydrate_posts, PostView};
use crate::identity::{MaybeUser, RequireAdmin, RequireUser};
use crate::query::{build_post_filter, ListPostsQuery, PostListParams};
use crate::slug::{is_valid_slug, slugify};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub banner_url: Option<String>,
    pub category_id: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub banner_url: Option<Option<String>>,
    pub category_id: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostPage {
    pub items: Vec<PostView>,
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

// ============================================================================
// Helpers
// ============================================================================

/// Published posts are public; drafts only to their author and admins.
pub(crate) fn can_view(post: &Post, caller: Option<&User>) -> bool {
    post.published
        || caller.is_some_and(|user| user.is_admin() || user.id == post.author_id)
}

fn post_slug(title: &str) -> ApiResult<String> {
    let slug = slugify(title);
    if !is_valid_slug(&slug) {
        return Err(ApiError::Validation(
            "Title must contain letters or numbers".to_string(),
        ));
    }
    Ok(slug)
}

/// Parses a category reference and checks that it exists.
async fn existing_category(state: &AppState, raw: &str) -> ApiResult<Uuid> {
    let unknown = || ApiError::Validation("Unknown category".to_string());
    let id = parse_id(raw).ok_or_else(unknown)?;
    state.store.find_category(id).await?.ok_or_else(unknown)?;
    Ok(id)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/posts
///
/// Query: `q`, `categoryName`, `authorId` (`me` or an id), `page`, `limit`.
/// Anonymous and foreign-author listings see published posts only; listing
/// your own posts includes drafts.
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Query(raw): Query<ListPostsQuery>,
) -> ApiResult<Json<PostPage>> {
    let params = PostListParams::parse(raw)?;
    let filter = build_post_filter(&params, caller.as_ref());
    let pagination = params.pagination;

    let total = state.store.count_posts(&filter).await?;
    let posts = state.store.find_posts(&filter, pagination).await?;
    let items = hydrate_posts(state.store.as_ref(), posts).await?;

    Ok(Json(PostPage {
        items,
        total,
        page: pagination.page,
        pages: pagination.pages(total),
    }))
}

/// GET /api/posts/{slug}
pub async fn get_post(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(slug): Path<String>,
) -> ApiResult<Json<PostView>> {
    let post = state
        .store
        .find_post_by_slug(&slug)
        .await?
        .filter(|post| can_view(post, caller.as_ref()))
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(hydrate_post(state.store.as_ref(), post).await?))
}

/// POST /api/posts
///
/// Any signed-in user may write; only an admin may publish on create.
pub async fn create_post(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let (Some(title), Some(content), Some(category)) = (
        present(payload.title),
        present(payload.content),
        present(payload.category_id),
    ) else {
        return Err(ApiError::missing_fields());
    };

    let slug = post_slug(&title)?;
    if state.store.find_post_by_slug(&slug).await?.is_some() {
        return Err(ApiError::Conflict("Slug exists".to_string()));
    }
    let category_id = existing_category(&state, &category).await?;

    let content = sanitize_html(&content);
    let excerpt = present(payload.excerpt).unwrap_or_else(|| excerpt_from(&content));
    let published = user.is_admin() && payload.published.unwrap_or(false);

    let now = Utc::now();
    let post = Post {
        id: Uuid::new_v4(),
        title,
        slug,
        excerpt,
        content,
        banner_url: present(payload.banner_url),
        category_id,
        author_id: user.id,
        published,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .insert_post(&post)
        .await
        .map_err(ApiError::conflict_as("Slug exists"))?;

    tracing::info!(post_id = %post.id, slug = %post.slug, author_id = %user.id, published, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// PATCH /api/posts/{id}
///
/// Only supplied fields change. A new title moves the slug; `bannerUrl: null`
/// clears the banner.
pub async fn update_post(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let id = parse_id(&id).ok_or_else(ApiError::not_found)?;

    let mut changes = PostChanges {
        updated_at: Utc::now(),
        ..Default::default()
    };

    if let Some(title) = present(payload.title) {
        let slug = post_slug(&title)?;
        if let Some(existing) = state.store.find_post_by_slug(&slug).await? {
            if existing.id != id {
                return Err(ApiError::Conflict("Slug exists".to_string()));
            }
        }
        changes.title = Some(title);
        changes.slug = Some(slug);
    }
    if let Some(content) = payload.content {
        changes.content = Some(sanitize_html(&content));
    }
    if let Some(excerpt) = payload.excerpt {
        changes.excerpt = Some(excerpt.trim().to_string());
    }
    if let Some(banner) = payload.banner_url {
        changes.banner_url = Some(present(banner));
    }
    if let Some(category) = present(payload.category_id) {
        changes.category_id = Some(existing_category(&state, &category).await?);
    }
    changes.published = payload.published;

    let post = state
        .store
        .update_post(id, &changes)
        .await
        .map_err(ApiError::conflict_as("Slug exists"))?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(post_id = %post.id, "post updated");
    Ok(Json(post))
}

/// DELETE /api/posts/{id} - comments are left in place
pub async fn delete_post(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let id = parse_id(&id).ok_or_else(ApiError::not_found)?;
    if !state.store.delete_post(id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!(post_id = %id, "post deleted");
    Ok(Json(OkResponse { ok: true }))
}

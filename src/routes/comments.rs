/**
 * Comment Routes
 * Per-post comment threads
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parse_id, present, posts::can_view, JsonBody};
use crate::content::sanitize_html;
use crate::db::models::Comment;
use crate::error::{ApiError, ApiResult};
use crate::hydrate::{hydrate_comments, AuthorRef, CommentView};
use crate::identity::RequireUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CommentRequest {
    pub content: Option<String>,
}

/// GET /api/comments/{post_id} - newest first; unknown posts have no comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<CommentView>>> {
    let Some(post_id) = parse_id(&post_id) else {
        return Ok(Json(Vec::new()));
    };

    let comments = state.store.list_comments(post_id).await?;
    Ok(Json(hydrate_comments(state.store.as_ref(), comments).await?))
}

/// POST /api/comments/{post_id}
pub async fn create_comment(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let content = present(payload.content)
        .ok_or_else(|| ApiError::Validation("Content required".to_string()))?;

    let post_not_found = || ApiError::NotFound("Post not found".to_string());
    let post_id = parse_id(&post_id).ok_or_else(post_not_found)?;
    state
        .store
        .find_post(post_id)
        .await?
        .filter(|post| can_view(post, Some(&user)))
        .ok_or_else(post_not_found)?;

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4(),
        post_id,
        author_id: user.id,
        content: sanitize_html(&content),
        created_at: now,
        updated_at: now,
    };
    state.store.insert_comment(&comment).await?;

    tracing::info!(comment_id = %comment.id, post_id = %post_id, author_id = %user.id, "comment added");

    let author = AuthorRef::new(user.id, user.name);
    Ok((StatusCode::CREATED, Json(CommentView::new(comment, author))))
}

/**
 * Category Routes
 * Public listing, admin-only create/rename/delete
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parse_id, present, JsonBody, OkResponse};
use crate::db::models::{Category, CategoryChanges};
use crate::error::{ApiError, ApiResult};
use crate::identity::RequireAdmin;
use crate::slug::{is_valid_slug, slugify};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

/// Slug for a category name, or 400 when nothing sluggable is left.
fn category_slug(name: &str) -> ApiResult<String> {
    let slug = slugify(name);
    if !is_valid_slug(&slug) {
        return Err(ApiError::Validation(
            "Name must contain letters or numbers".to_string(),
        ));
    }
    Ok(slug)
}

/// GET /api/categories - sorted by name
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = state.store.list_categories().await?;
    Ok(Json(categories))
}

/// POST /api/categories
pub async fn create_category(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let name = present(payload.name).ok_or_else(|| ApiError::Validation("Name required".to_string()))?;
    let slug = category_slug(&name)?;

    if state.store.find_category_by_slug(&slug).await?.is_some() {
        return Err(ApiError::Conflict("Exists".to_string()));
    }

    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4(),
        name,
        slug,
        created_at: now,
        updated_at: now,
    };
    state
        .store
        .insert_category(&category)
        .await
        .map_err(ApiError::conflict_as("Exists"))?;

    tracing::info!(category_id = %category.id, slug = %category.slug, admin_id = %admin.id, "category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH /api/categories/{id} - renaming recomputes the slug
pub async fn update_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CategoryRequest>,
) -> ApiResult<Json<Category>> {
    let id = parse_id(&id).ok_or_else(ApiError::not_found)?;

    let mut changes = CategoryChanges {
        name: None,
        slug: None,
        updated_at: Utc::now(),
    };

    if let Some(name) = present(payload.name) {
        let slug = category_slug(&name)?;
        if let Some(existing) = state.store.find_category_by_slug(&slug).await? {
            if existing.id != id {
                return Err(ApiError::Conflict("Exists".to_string()));
            }
        }
        changes.name = Some(name);
        changes.slug = Some(slug);
    }

    let category = state
        .store
        .update_category(id, &changes)
        .await
        .map_err(ApiError::conflict_as("Exists"))?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(category))
}

/// DELETE /api/categories/{id} - posts keep their (now dangling) reference
pub async fn delete_category(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let id = parse_id(&id).ok_or_else(ApiError::not_found)?;
    if !state.store.delete_category(id).await? {
        return Err(ApiError::not_found());
    }

    tracing::info!(category_id = %id, "category deleted");
    Ok(Json(OkResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;
    use crate::testing::TestApp;
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_is_public_and_sorted_by_name() {
        let app = TestApp::new();
        app.category("Web").await;
        app.category("AI").await;
        app.category("Golang").await;

        let (status, body) = app.send(Method::GET, "/api/categories", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["AI", "Golang", "Web"]);
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let app = TestApp::new();
        let (_, user_token) = app.user("Ada", Role::User).await;
        let body = json!({ "name": "Rust" });

        let (status, _) = app
            .send(Method::POST, "/api/categories", None, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .send(Method::POST, "/api/categories", Some(&user_token), Some(body))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin only");
        assert_eq!(app.store.category_count(), 0);
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_rejects_duplicates() {
        let app = TestApp::new();
        let (_, admin) = app.user("Root", Role::Admin).await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/categories",
                Some(&admin),
                Some(json!({ "name": "Programming & Development" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "programming-and-development");

        let (status, body) = app
            .send(
                Method::POST,
                "/api/categories",
                Some(&admin),
                Some(json!({ "name": "programming and development" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Exists");
    }

    #[tokio::test]
    async fn test_create_rejects_unsluggable_names() {
        let app = TestApp::new();
        let (_, admin) = app.user("Root", Role::Admin).await;

        for name in [json!({}), json!({ "name": "   " }), json!({ "name": "!!!" })] {
            let (status, _) = app
                .send(Method::POST, "/api/categories", Some(&admin), Some(name))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_rename_recomputes_slug() {
        let app = TestApp::new();
        let (_, admin) = app.user("Root", Role::Admin).await;
        let category = app.category("Golang").await;

        let (status, body) = app
            .send(
                Method::PATCH,
                &format!("/api/categories/{}", category.id),
                Some(&admin),
                Some(json!({ "name": "Go Lang" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Go Lang");
        assert_eq!(body["slug"], "go-lang");
    }

    #[tokio::test]
    async fn test_rename_onto_existing_slug_conflicts() {
        let app = TestApp::new();
        let (_, admin) = app.user("Root", Role::Admin).await;
        app.category("Web").await;
        let other = app.category("AI").await;

        let (status, _) = app
            .send(
                Method::PATCH,
                &format!("/api/categories/{}", other.id),
                Some(&admin),
                Some(json!({ "name": "WEB" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // renaming to its own slug is fine
        let (status, _) = app
            .send(
                Method::PATCH,
                &format!("/api/categories/{}", other.id),
                Some(&admin),
                Some(json!({ "name": "ai" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_patch_and_delete_unknown_ids_are_not_found() {
        let app = TestApp::new();
        let (_, admin) = app.user("Root", Role::Admin).await;

        for uri in [
            format!("/api/categories/{}", Uuid::new_v4()),
            "/api/categories/not-an-id".to_string(),
        ] {
            let (status, _) = app
                .send(Method::PATCH, &uri, Some(&admin), Some(json!({ "name": "X" })))
                .await;
            assert_eq!(status, StatusCode::NOT_FOUND);

            let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_non_admin_patch_is_forbidden_before_lookup() {
        let app = TestApp::new();
        let (_, token) = app.user("Ada", Role::User).await;
        let (status, _) = app
            .send(
                Method::PATCH,
                &format!("/api/categories/{}", Uuid::new_v4()),
                Some(&token),
                Some(json!({ "name": "X" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_non_admin_delete_is_forbidden() {
        let app = TestApp::new();
        let (_, token) = app.user("Ada", Role::User).await;
        let category = app.category("Web").await;

        let (status, _) = app
            .send(
                Method::DELETE,
                &format!("/api/categories/{}", category.id),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(app.store.category_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_keeps_posts_with_dangling_reference() {
        let app = TestApp::new();
        let (author, admin) = app.user("Root", Role::Admin).await;
        let category = app.category("Web").await;
        let post = app.post("Hello", &category, &author, true).await;

        let (status, body) = app
            .send(
                Method::DELETE,
                &format!("/api/categories/{}", category.id),
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));

        let (status, body) = app
            .send(Method::GET, &format!("/api/posts/{}", post.slug), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"]["_id"], category.id.to_string());
        assert!(body["category"].get("name").is_none());
    }
}

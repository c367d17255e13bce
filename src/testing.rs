//! Fixtures for handler tests: a full router over an in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::config::Config;
use crate::db::memory::MemoryStore;
use crate::db::models::{Category, Comment, Post, Role, User};
use crate::db::Store;
use crate::identity::{new_user, token::issue_token};
use crate::slug::slugify;
use crate::state::AppState;

pub fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), Config::for_tests())
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), Config::for_tests());
        let router = crate::create_app(state.clone());
        Self {
            state,
            store,
            router,
        }
    }

    /// Inserts a user directly and returns it with a valid bearer token.
    pub async fn user(&self, name: &str, role: Role) -> (User, String) {
        let email = format!("{}@example.com", name.to_lowercase());
        let user = new_user(name, &email, String::new(), role);
        self.store.insert_user(&user).await.unwrap();
        let token = issue_token(&user, &self.state.config.jwt_secret).unwrap();
        (user, token)
    }

    pub async fn category(&self, name: &str) -> Category {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_category(&category).await.unwrap();
        category
    }

    pub async fn post(&self, title: &str, category: &Category, author: &User, published: bool) -> Post {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slugify(title),
            excerpt: title.to_string(),
            content: format!("<p>{title}</p>"),
            banner_url: None,
            category_id: category.id,
            author_id: author.id,
            published,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_post(&post).await.unwrap();
        post
    }

    pub async fn comment(&self, post: &Post, author: &User, content: &str) -> Comment {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            author_id: author.id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_comment(&comment).await.unwrap();
        comment
    }

    pub fn backdate_post(&self, id: Uuid, by: Duration) {
        self.store.backdate_post(id, by);
    }

    pub fn backdate_comment(&self, id: Uuid, by: Duration) {
        self.store.backdate_comment(id, by);
    }

    /// Sends a request through the full router and parses the JSON body
    /// (`Value::Null` when the body is not JSON).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    /// Sends a raw JSON-typed body, for malformed payloads.
    pub async fn send_raw(&self, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

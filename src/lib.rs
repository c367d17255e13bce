//! Blog API - library for app logic and testing

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod hydrate;
pub mod identity;
pub mod logging;
pub mod query;
pub mod rate_limit;
pub mod routes;
pub mod seed;
pub mod slug;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::Config;
use crate::db::{DbConfig, PgStore};
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

/// Request bodies above this size are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

const BANNER: &str = "Blog API is running. Try /api/health";

/// CORS for the configured allowlist. Requests without an `Origin` header
/// (curl, server-to-server) are unaffected.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    tracing::info!(origins = ?origins, "CORS allowlist");

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(routes::health::health_ping))
        .route("/api/health/ready", get(routes::health::health_ready))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/categories",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/api/categories/{id}",
            patch(routes::categories::update_category)
                .delete(routes::categories::delete_category),
        )
        .route(
            "/api/posts",
            get(routes::posts::list_posts).post(routes::posts::create_post),
        )
        // GET addresses a post by slug, PATCH/DELETE by id.
        .route(
            "/api/posts/{key}",
            get(routes::posts::get_post)
                .patch(routes::posts::update_post)
                .delete(routes::posts::delete_post),
        )
        .route(
            "/api/comments/{post_id}",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config.cors_origins);
    let limiter = RateLimiter::new(
        state.config.rate_limit_max,
        state.config.rate_limit_window,
        state.config.trust_proxy,
    );

    Router::new()
        .route("/", get(|| async { BANNER }))
        .merge(api_routes())
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::limit_requests,
        ))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init(&logging::LogConfig::from_env());

    routes::health::init_start_time();

    let config = Config::from_env();
    config.validate()?;
    if config.is_production() && config.admin_email.is_none() {
        tracing::warn!("ADMIN_EMAIL is not set; no admin account will be seeded");
    }

    let db_config = DbConfig::from_env()?;
    let pool = db::init_pool(&db_config)
        .await
        .context("failed to connect to the database")?;
    db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let store = Arc::new(PgStore::new(pool));
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT configuration")?;

    let state = AppState::new(store.clone(), config);
    seed::seed_admin_and_categories(&state)
        .await
        .context("failed to seed initial data")?;

    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
        tracing::info!("shutdown signal received");
    })
    .await
    .context("server error")?;

    store.close().await;
    Ok(())
}

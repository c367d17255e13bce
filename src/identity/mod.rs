//! Identity: registration, login and bearer-credential resolution.

pub mod access;
pub mod password;
pub mod token;

pub use access::{authorize, Access, Decision, Denial, MaybeUser, RequireAdmin, RequireUser};

use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Role, User};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Public profile returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

/// Creates a `user` account. The email is stored lowercased.
pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
) -> ApiResult<Profile> {
    let name = name.trim();
    let email = email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::missing_fields());
    }

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email in use".to_string()));
    }

    let password_hash = password::hash_password(password.to_string(), state.config.bcrypt_cost).await?;
    let user = new_user(name, &email, password_hash, Role::User);
    state
        .store
        .insert_user(&user)
        .await
        .map_err(ApiError::conflict_as("Email in use"))?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Profile {
        id: user.id,
        name: user.name,
        email: user.email,
        role: None,
    })
}

pub fn new_user(name: &str, email: &str, password_hash: String, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash,
        role,
        created_at: now,
        updated_at: now,
    }
}

/// Unknown email and wrong password fail identically.
pub async fn login(state: &AppState, email: &str, password: &str) -> ApiResult<(String, Profile)> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(invalid_credentials());
    }

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !password::verify_password(password.to_string(), user.password_hash.clone()).await? {
        return Err(invalid_credentials());
    }

    let token = token::issue_token(&user, &state.config.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok((
        token,
        Profile {
            id: user.id,
            name: user.name,
            email: user.email,
            role: Some(user.role),
        },
    ))
}

/// Resolves a credential to its user. `Ok(None)` when the signature, expiry
/// or embedded id do not check out; `Err` only for store failures.
pub async fn verify(state: &AppState, credential: &str) -> ApiResult<Option<User>> {
    let claims = match token::decode_token(credential, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "rejected credential");
            return Ok(None);
        }
    };

    Ok(state.store.find_user(claims.sub).await?)
}

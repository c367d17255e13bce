//! Per-route access rules, evaluated by extractors before a handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{extract_bearer_token, verify};
use crate::db::models::{Role, User};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => ApiError::Unauthorized("Unauthorized".to_string()),
            Denial::Forbidden => ApiError::Forbidden("Admin only".to_string()),
        }
    }
}

pub fn authorize(access: Access, caller: Option<&User>) -> Decision {
    match (access, caller) {
        (Access::Public, _) => Decision::Allow,
        (_, None) => Decision::Deny(Denial::Unauthenticated),
        (Access::Authenticated, Some(_)) => Decision::Allow,
        (Access::Admin, Some(user)) if user.role == Role::Admin => Decision::Allow,
        (Access::Admin, Some(_)) => Decision::Deny(Denial::Forbidden),
    }
}

/// Resolves the caller for a route that requires one.
async fn caller_for(parts: &Parts, state: &AppState, access: Access) -> Result<User, ApiError> {
    let caller = match extract_bearer_token(&parts.headers) {
        None => None,
        Some(credential) => Some(
            verify(state, credential)
                .await?
                .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?,
        ),
    };

    match authorize(access, caller.as_ref()) {
        Decision::Allow => caller.ok_or_else(|| Denial::Unauthenticated.into()),
        Decision::Deny(denial) => Err(denial.into()),
    }
}

/// Caller if a valid credential was presented, anonymous otherwise.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

/// Any signed-in user (401 otherwise).
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

/// Signed-in admin (401 if anonymous, 403 if not an admin).
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(credential) = extract_bearer_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        match verify(state, credential).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(e) => {
                tracing::warn!(error = %e, "caller resolution failed, continuing anonymously");
                Ok(MaybeUser(None))
            }
        }
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        caller_for(parts, state, Access::Authenticated)
            .await
            .map(RequireUser)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        caller_for(parts, state, Access::Admin).await.map(RequireAdmin)
    }
}

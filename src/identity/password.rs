//! bcrypt hashing, kept off the async executor.

use bcrypt::{hash, verify};

use crate::error::ApiError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, ApiError> {
    let outcome = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?;

    Ok(outcome.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "stored password hash is unreadable");
        false
    }))
}

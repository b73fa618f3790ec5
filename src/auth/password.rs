use crate::error::AppError;
use bcrypt::{hash, verify};

/// bcrypt cost used when none is configured.
pub const DEFAULT_COST: u32 = 12;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(hash(password, cost)?)
}

/// Checks `password` against a stored hash.
///
/// A hash bcrypt cannot parse (such as the placeholder on the guest account)
/// never matches.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    match verify(password, hashed_password) {
        Ok(matches) => matches,
        Err(e) => {
            log::warn!("stored password hash could not be verified: {}", e);
            false
        }
    }
}

/// Hashes on the blocking pool so request workers are not stalled.
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("password hashing task failed: {}", e)))?
}

pub async fn verify_password_blocking(password: String, hashed_password: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hashed_password))
        .await
        .map_err(|e| AppError::InternalServerError(format!("password verification task failed: {}", e)))
}

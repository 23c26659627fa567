use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::thoughts::repo_types::Thought;

pub const MAX_CONTENT_CHARS: usize = 1000;

/// Returns the trimmed content to store.
pub fn validate_content(raw: &str) -> Result<&str, AppError> {
    if raw.is_empty() {
        return Err(AppError::validation("Content is required"));
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Content cannot be empty"));
    }
    if trimmed.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::validation("Content too long"));
    }
    Ok(trimmed)
}

/// Tokens outlive accounts; a subject whose row is gone is not an owner.
async fn ensure_owner_exists(db: &SqlitePool, user_id: i64) -> Result<(), AppError> {
    let exists = User::exists(db, user_id)
        .await
        .map_err(|e| AppError::internal("Internal server error", e))?;
    if !exists {
        warn!(user_id, "token subject no longer exists");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub async fn create_thought(
    db: &SqlitePool,
    user_id: i64,
    raw_content: &str,
) -> Result<Thought, AppError> {
    ensure_owner_exists(db, user_id).await?;
    let content = validate_content(raw_content)?;

    let thought = Thought::create(db, user_id, content)
        .await
        .map_err(|e| AppError::internal("Could not create thought", e))?;

    info!(user_id, thought_id = thought.id, "thought created");
    Ok(thought)
}

pub async fn list_thoughts(db: &SqlitePool, user_id: i64) -> Result<Vec<Thought>, AppError> {
    ensure_owner_exists(db, user_id).await?;
    Thought::list_by_user(db, user_id)
        .await
        .map_err(|e| AppError::internal("Could not fetch thoughts", e))
}

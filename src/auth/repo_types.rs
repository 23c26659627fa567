use serde::Serialize;
use sqlx::FromRow;

use crate::db::Timestamps;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

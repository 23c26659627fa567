use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::Timestamps;

/// Thought record; `user_id` is the owner and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Thought {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

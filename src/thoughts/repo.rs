use sqlx::SqlitePool;

use crate::thoughts::repo_types::Thought;

const THOUGHT_COLUMNS: &str = "id, content, user_id, created_at, updated_at";

impl Thought {
    pub async fn create(db: &SqlitePool, user_id: i64, content: &str) -> anyhow::Result<Thought> {
        let thought = sqlx::query_as::<_, Thought>(&format!(
            "INSERT INTO thoughts (content, user_id) VALUES (?, ?) RETURNING {THOUGHT_COLUMNS}"
        ))
        .bind(content)
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(thought)
    }

    /// Every thought owned by `user_id`, newest first.
    pub async fn list_by_user(db: &SqlitePool, user_id: i64) -> anyhow::Result<Vec<Thought>> {
        let rows = sqlx::query_as::<_, Thought>(&format!(
            r#"
            SELECT {THOUGHT_COLUMNS}
            FROM thoughts
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::db;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config.database_url, config.database_max_connections).await?;
        db::migrate(&db).await?;

        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self { db, config, keys }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

#[cfg(test)]
impl AppState {
    /// Fresh in-memory database with the schema applied.
    pub async fn fake() -> Self {
        let db = db::connect_in_memory().await.expect("in-memory db");
        db::migrate(&db).await.expect("migrations");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            database_max_connections: 1,
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24,
            },
            host: "127.0.0.1".into(),
            port: 0,
            cors_allowed_origins: Vec::new(),
        });

        Self::from_parts(db, config)
    }
}

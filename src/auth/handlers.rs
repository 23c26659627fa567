use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, Credentials, PublicUser},
        extractors::AuthUser,
        services,
    },
    error::AppError,
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let token = services::register(&state.db, &state.keys, payload).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let token = services::login(&state.db, &state.keys, payload).await?;
    Ok(Json(AuthResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::current_user(&state.db, user_id).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: 3,
            email: "test@example.com".to_string(),
            email_verified: false,
            created_at: datetime!(2024-05-01 12:30:00 UTC),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "email": "test@example.com",
                "email_verified": false,
                "created_at": "2024-05-01T12:30:00Z",
            })
        );
    }
}

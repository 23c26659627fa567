use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::AuthUser,
    error::AppError,
    extract::AppJson,
    state::AppState,
    thoughts::{dto::CreateThoughtRequest, repo_types::Thought, services},
};

pub fn thought_routes() -> Router<AppState> {
    Router::new().route("/thoughts", get(list_thoughts).post(create_thought))
}

#[instrument(skip(state))]
pub async fn list_thoughts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Thought>>, AppError> {
    let thoughts = services::list_thoughts(&state.db, user_id).await?;
    Ok(Json(thoughts))
}

#[instrument(skip(state, payload))]
pub async fn create_thought(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateThoughtRequest>,
) -> Result<(StatusCode, Json<Thought>), AppError> {
    let thought = services::create_thought(&state.db, user_id, payload.content()).await?;
    Ok((StatusCode::CREATED, Json(thought)))
}

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::error::AppError;

/// Identity resolved from a verified bearer token. Taking this as a handler
/// argument is what makes a route protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) if !value.is_empty() => value,
            _ => {
                warn!("missing Authorization header");
                return Err(AppError::Unauthorized);
            }
        };

        // Anything that is not a well-formed bearer token is left for the
        // verifier to reject.
        let raw = header.to_str().unwrap_or_default();
        let token = raw
            .strip_prefix("Bearer ")
            .or_else(|| raw.strip_prefix("bearer "))
            .unwrap_or(raw);

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!("invalid or expired token");
            AppError::from(e)
        })?;

        Ok(AuthUser(claims.user_id()?))
    }
}

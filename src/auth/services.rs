use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::{
    dto::{Credentials, PublicUser},
    jwt::JwtKeys,
    password::{hash_password, verify_dummy_password, verify_password},
    repo::is_unique_violation,
    repo_types::User,
};
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Applies the credential rules in order and reports only the first failure.
pub fn validate_credentials(input: &Credentials) -> Result<(), AppError> {
    let (email, password) = (input.email(), input.password());
    if email.is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if !is_valid_email(email) {
        return Err(AppError::validation("Invalid email format"));
    }
    if password.is_empty() {
        return Err(AppError::validation("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Hash, persist, then issue a token for the new account.
pub async fn register(
    db: &SqlitePool,
    keys: &JwtKeys,
    input: Credentials,
) -> Result<String, AppError> {
    validate_credentials(&input)?;

    let email = input.email();
    let existing = User::find_by_email(db, email)
        .await
        .map_err(|e| AppError::internal("Could not create user", e))?;
    if existing.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::UserAlreadyExists);
    }

    let hash = hash_password(input.password())
        .map_err(|e| AppError::internal("Could not create user", e))?;

    let user = match User::create(db, email, &hash).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            warn!(%email, "email registered concurrently");
            return Err(AppError::UserAlreadyExists);
        }
        Err(e) => return Err(AppError::internal("Could not create user", e)),
    };

    let token = keys
        .sign(user.id)
        .map_err(|e| AppError::internal("Could not create token", e))?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(token)
}

/// Unknown email and wrong password produce the same error.
pub async fn login(
    db: &SqlitePool,
    keys: &JwtKeys,
    input: Credentials,
) -> Result<String, AppError> {
    validate_credentials(&input)?;

    let (email, password) = (input.email(), input.password());
    let user = User::find_by_email(db, email)
        .await
        .map_err(|e| AppError::internal("Internal server error", e))?;

    let user = match user {
        Some(user) if verify_password(password, &user.password_hash) => user,
        Some(user) => {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            // Same argon2 cost as a real mismatch.
            verify_dummy_password(password);
            warn!(%email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = keys
        .sign(user.id)
        .map_err(|e| AppError::internal("Could not create token", e))?;

    info!(user_id = user.id, "user logged in");
    Ok(token)
}

pub async fn current_user(db: &SqlitePool, user_id: i64) -> Result<PublicUser, AppError> {
    let user = User::find_by_id(db, user_id)
        .await
        .map_err(|e| AppError::internal("Internal server error", e))?
        .ok_or_else(|| {
            warn!(user_id, "token subject no longer exists");
            AppError::NotFound("User not found")
        })?;
    Ok(user.into())
}

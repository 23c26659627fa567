use serde::{Deserialize, Serialize};

use crate::auth::jwt::InvalidToken;

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, InvalidToken> {
        self.sub.parse().map_err(|_| InvalidToken)
    }
}

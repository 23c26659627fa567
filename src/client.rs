//! Minimal HTTP client for the thoughts API.
//!
//! ```no_run
//! # async fn demo() -> Result<(), thoughts::client::ClientError> {
//! let mut client = thoughts::client::ThoughtsClient::new("http://localhost:8080");
//! client.login("me@example.com", "password123").await?;
//! client.create_thought("remember the milk").await?;
//! for thought in client.list_thoughts().await? {
//!     println!("{}: {}", thought.id, thought.content);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use thiserror::Error;

use crate::auth::dto::{AuthResponse, PublicUser};
use crate::thoughts::Thought;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ThoughtsClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
}

impl ThoughtsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            token: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Creates the account and keeps the returned token.
    pub async fn register(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let body = json!({ "email": email, "password": password });
        let res = self
            .request(Method::POST, "/api/auth/register")
            .json(&body)
            .send()
            .await?;
        let auth: AuthResponse = expect(res, StatusCode::CREATED).await?;
        self.token = Some(auth.token);
        Ok(())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let body = json!({ "email": email, "password": password });
        let res = self
            .request(Method::POST, "/api/auth/login")
            .json(&body)
            .send()
            .await?;
        let auth: AuthResponse = expect(res, StatusCode::OK).await?;
        self.token = Some(auth.token);
        Ok(())
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        let res = self.request(Method::GET, "/api/me").send().await?;
        expect(res, StatusCode::OK).await
    }

    pub async fn create_thought(&self, content: &str) -> Result<Thought, ClientError> {
        let res = self
            .request(Method::POST, "/api/thoughts")
            .json(&json!({ "content": content }))
            .send()
            .await?;
        expect(res, StatusCode::CREATED).await
    }

    pub async fn list_thoughts(&self) -> Result<Vec<Thought>, ClientError> {
        let res = self.request(Method::GET, "/api/thoughts").send().await?;
        expect(res, StatusCode::OK).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

async fn expect<T: DeserializeOwned>(res: Response, want: StatusCode) -> Result<T, ClientError> {
    let status = res.status();
    if status == want {
        return Ok(res.json().await?);
    }
    let message = match res.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unexpected status").to_string(),
    };
    Err(ClientError::Api { status, message })
}

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, thoughts};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(thoughts::router()),
        )
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(%origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub async fn serve(app: Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use jsonwebtoken::{encode, Header};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        state: AppState,
    }

    impl TestApp {
        async fn new() -> Self {
            Self {
                state: AppState::fake().await,
            }
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            auth: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(auth) = auth {
                req = req.header(header::AUTHORIZATION, auth);
            }
            let req = match body {
                Some(body) => req
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };

            let res = build_app(self.state.clone()).oneshot(req).await.unwrap();
            let status = res.status();
            let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            (status, value)
        }

        async fn register(&self, email: &str, password: &str) -> String {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/auth/register",
                    None,
                    Some(json!({ "email": email, "password": password })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
            body["token"].as_str().expect("token").to_string()
        }

        async fn post_thought(&self, token: &str, content: &str) -> (StatusCode, Value) {
            self.send(
                Method::POST,
                "/api/thoughts",
                Some(&format!("Bearer {token}")),
                Some(json!({ "content": content })),
            )
            .await
        }

        async fn list_thoughts(&self, token: &str) -> (StatusCode, Value) {
            self.send(
                Method::GET,
                "/api/thoughts",
                Some(&format!("Bearer {token}")),
                None,
            )
            .await
        }
    }

    fn error(message: &str) -> Value {
        json!({ "error": message })
    }

    #[tokio::test]
    async fn health_is_plaintext_ok() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("OK".into()));
    }

    #[tokio::test]
    async fn register_validation_messages() {
        let app = TestApp::new().await;
        let cases = [
            (json!({ "password": "password123" }), "Email is required"),
            (
                json!({ "email": null, "password": "password123" }),
                "Email is required",
            ),
            (
                json!({ "email": "invalid-email", "password": "password123" }),
                "Invalid email format",
            ),
            (json!({ "email": "test@example.com" }), "Password is required"),
            (
                json!({ "email": "test@example.com", "password": null }),
                "Password is required",
            ),
            (
                json!({ "email": "test@example.com", "password": "short" }),
                "Password must be at least 6 characters",
            ),
        ];
        for (payload, message) in cases {
            let (status, body) = app
                .send(Method::POST, "/api/auth/register", None, Some(payload))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, error(message));
        }
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_request() {
        let app = TestApp::new().await;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = build_app(app.state.clone()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, error("Invalid request"));
    }

    #[tokio::test]
    async fn register_then_login_and_me() {
        let app = TestApp::new().await;
        let token = app.register("test@example.com", "password123").await;
        let user_id = app.state.keys.verify(&token).unwrap().user_id().unwrap();

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "test@example.com", "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let login_token = body["token"].as_str().unwrap();
        assert_eq!(app.state.keys.verify(login_token).unwrap().user_id().unwrap(), user_id);

        let (status, me) = app
            .send(
                Method::GET,
                "/api/me",
                Some(&format!("Bearer {login_token}")),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], json!(user_id));
        assert_eq!(me["email"], json!("test@example.com"));
        assert_eq!(me["email_verified"], json!(false));
        assert!(me["created_at"].is_string());
        assert!(me.get("password_hash").is_none());
        assert_eq!(me.as_object().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn duplicate_registration_is_bad_request() {
        let app = TestApp::new().await;
        app.register("dup@example.com", "password123").await;
        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "email": "dup@example.com", "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, error("User already exists"));
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let app = TestApp::new().await;
        app.register("test@example.com", "password123").await;

        let wrong = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "test@example.com", "password": "wrongpassword" })),
            )
            .await;
        let unknown = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "nobody@example.com", "password": "password123" })),
            )
            .await;

        assert_eq!(wrong, (StatusCode::UNAUTHORIZED, error("Invalid credentials")));
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn protected_routes_distinguish_missing_and_bad_tokens() {
        let app = TestApp::new().await;
        for (method, uri) in [
            (Method::GET, "/api/me"),
            (Method::GET, "/api/thoughts"),
            (Method::POST, "/api/thoughts"),
        ] {
            let body = (method == Method::POST).then(|| json!({ "content": "x" }));
            let missing = app.send(method.clone(), uri, None, body.clone()).await;
            assert_eq!(missing, (StatusCode::UNAUTHORIZED, error("Unauthorized")));

            let bad = app
                .send(method.clone(), uri, Some("Bearer not-a-token"), body)
                .await;
            assert_eq!(
                bad,
                (StatusCode::UNAUTHORIZED, error("Invalid or expired token"))
            );
        }
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let app = TestApp::new().await;
        let token = app.register("old@example.com", "password123").await;
        let user_id = app.state.keys.verify(&token).unwrap().user_id().unwrap();

        let now = time::OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now - 25 * 60 * 60,
            exp: now - 60 * 60,
            iss: app.state.keys.issuer.clone(),
            aud: app.state.keys.audience.clone(),
        };
        let expired = encode(&Header::default(), &claims, &app.state.keys.encoding).unwrap();

        let (status, body) = app
            .send(Method::GET, "/api/me", Some(&format!("Bearer {expired}")), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, error("Invalid or expired token"));
    }

    #[tokio::test]
    async fn me_after_user_removed_is_not_found() {
        let app = TestApp::new().await;
        let token = app.register("gone@example.com", "password123").await;
        sqlx::query("DELETE FROM users WHERE email = ?")
            .bind("gone@example.com")
            .execute(&app.state.db)
            .await
            .unwrap();

        let (status, body) = app
            .send(Method::GET, "/api/me", Some(&format!("Bearer {token}")), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, error("User not found"));

        let (status, body) = app.list_thoughts(&token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, error("Unauthorized"));
    }

    #[tokio::test]
    async fn create_then_list_round_trip() {
        let app = TestApp::new().await;
        let token = app.register("writer@example.com", "password123").await;
        let user_id = app.state.keys.verify(&token).unwrap().user_id().unwrap();

        let (status, created) = app.post_thought(&token, "Hello, world").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["content"], json!("Hello, world"));
        assert_eq!(created["user_id"], json!(user_id));

        let (status, listed) = app.list_thoughts(&token).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], created);
        assert!(listed[0]["id"].as_i64().unwrap() > 0);
        assert!(listed[0]["created_at"].is_string());
        assert!(listed[0]["updated_at"].is_string());
    }

    #[tokio::test]
    async fn content_is_trimmed_and_validated() {
        let app = TestApp::new().await;
        let token = app.register("v@example.com", "password123").await;

        let cases = [
            (String::new(), "Content is required"),
            ("   ".to_string(), "Content cannot be empty"),
            ("a".repeat(1001), "Content too long"),
        ];
        for (content, message) in cases {
            let (status, body) = app.post_thought(&token, &content).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, error(message));
        }

        let bearer = format!("Bearer {token}");
        for payload in [json!({}), json!({ "content": null })] {
            let (status, body) = app
                .send(Method::POST, "/api/thoughts", Some(&bearer), Some(payload))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, error("Content is required"));
        }

        let (status, body) = app.post_thought(&token, &"a".repeat(1000)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["content"].as_str().unwrap().len(), 1000);

        let (status, body) = app.post_thought(&token, "  padded  ").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["content"], json!("padded"));
    }

    #[tokio::test]
    async fn thoughts_are_isolated_per_user_and_newest_first() {
        let app = TestApp::new().await;
        let alice = app.register("alice@example.com", "password123").await;
        let bob = app.register("bob@example.com", "password123").await;

        for content in ["a1", "a2", "a3"] {
            assert_eq!(app.post_thought(&alice, content).await.0, StatusCode::CREATED);
        }
        for content in ["b1", "b2"] {
            assert_eq!(app.post_thought(&bob, content).await.0, StatusCode::CREATED);
        }

        let (_, listed) = app.list_thoughts(&alice).await;
        let contents: Vec<_> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["content"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(contents, vec!["a3", "a2", "a1"]);

        let (_, listed) = app.list_thoughts(&bob).await;
        assert_eq!(listed.as_array().unwrap().len(), 2);
    }
}

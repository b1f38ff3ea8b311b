//! End-to-end tests of the auth API against the in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use expense_auth::{
    build_router, AuthConfig, AuthService, Environment, MemoryUserStore, NewUser, StoreError,
    TokenKind, User, UserStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    auth: Arc<AuthService>,
    store: Arc<MemoryUserStore>,
}

fn test_config(environment: Environment) -> AuthConfig {
    AuthConfig {
        access_token_secret: "integration-access-secret-0123456789".into(),
        refresh_token_secret: "integration-refresh-secret-0123456789".into(),
        access_token_expiration: 900,
        refresh_token_expiration: 604_800,
        environment,
        argon2_memory_cost: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

fn app_with(environment: Environment) -> TestApp {
    let store = Arc::new(MemoryUserStore::new());
    let auth = Arc::new(AuthService::new(store.clone(), test_config(environment)));
    TestApp {
        router: build_router(auth.clone()),
        auth,
        store,
    }
}

fn app() -> TestApp {
    app_with(Environment::Development)
}

struct TestResponse {
    status: StatusCode,
    set_cookies: Vec<String>,
    body: Value,
}

impl TestResponse {
    fn cookie(&self, name: &str) -> Option<&String> {
        self.set_cookies
            .iter()
            .find(|c| c.starts_with(&format!("{name}=")))
    }

    fn cookie_value(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|c| {
            c.split(';')
                .next()
                .unwrap_or_default()
                .trim_start_matches(&format!("{name}="))
                .to_string()
        })
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    TestResponse {
        status,
        set_cookies,
        body,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn register_body(email: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": email,
        "password": "Analytical1"
    })
}

async fn register(app: &TestApp, email: &str) -> TestResponse {
    send(app, post_json("/auth/register", register_body(email))).await
}

async fn login(app: &TestApp, email: &str, password: &str) -> TestResponse {
    send(
        app,
        post_json("/auth/login", json!({ "email": email, "password": password })),
    )
    .await
}

fn me_with_bearer(token: &str) -> Request<Body> {
    Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn with_cookie(method: &str, uri: &str, cookie: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_register_returns_user_tokens_and_cookies() {
    let app = app();
    let res = register(&app, "ada@example.com").await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["user"]["firstName"], "Ada");
    assert_eq!(res.body["user"]["email"], "ada@example.com");
    assert!(res.body["user"].get("passwordHash").is_none());
    assert!(res.body["user"].get("password_hash").is_none());

    let access = res.body["accessToken"].as_str().unwrap();
    assert_eq!(res.cookie_value("accessToken").as_deref(), Some(access));
    assert_eq!(
        res.cookie_value("refreshToken").as_deref(),
        res.body["refreshToken"].as_str()
    );

    let access_cookie = res.cookie("accessToken").unwrap();
    assert!(access_cookie.contains("HttpOnly"));
    assert!(access_cookie.contains("SameSite=Lax"));
    assert!(access_cookie.contains("Max-Age=900"));
    assert!(!access_cookie.contains("Secure"));
    assert!(res.cookie("refreshToken").unwrap().contains("Max-Age=604800"));
}

#[tokio::test]
async fn test_production_cookies_are_secure_and_cross_site() {
    let app = app_with(Environment::Production);
    let res = register(&app, "ada@example.com").await;

    for name in ["accessToken", "refreshToken"] {
        let cookie = res.cookie(name).unwrap();
        assert!(cookie.contains("Secure"), "{cookie}");
        assert!(cookie.contains("SameSite=None"), "{cookie}");
        assert!(cookie.contains("HttpOnly"), "{cookie}");
    }
}

#[tokio::test]
async fn test_register_then_login_returns_same_user() {
    let app = app();
    let emails = ["a@example.com", "b@example.com", "c@example.com"];

    for email in emails {
        let registered = register(&app, email).await;
        assert_eq!(registered.status, StatusCode::CREATED);

        let logged_in = login(&app, email, "Analytical1").await;
        assert_eq!(logged_in.status, StatusCode::OK);
        assert_eq!(logged_in.body["message"], "Login successful");
        assert_eq!(logged_in.body["user"]["id"], registered.body["user"]["id"]);
        assert!(logged_in.cookie("accessToken").is_some());
    }
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = app();
    let first = register(&app, "dup@example.com").await;

    let second = send(
        &app,
        post_json(
            "/auth/register",
            json!({
                "firstName": "Other",
                "lastName": "Person",
                "email": "dup@example.com",
                "password": "SomethingElse9"
            }),
        ),
    )
    .await;

    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.body["message"], "User already exists");
    assert!(second.set_cookies.is_empty());

    let stored = app
        .store
        .find_by_email("dup@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id.to_string(), first.body["user"]["id"].as_str().unwrap());
    assert_eq!(stored.first_name, "Ada");

    // The original password still logs in
    assert_eq!(
        login(&app, "dup@example.com", "Analytical1").await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_register_validation() {
    let app = app();
    let res = send(
        &app,
        post_json(
            "/auth/register",
            json!({
                "firstName": "",
                "lastName": "Lovelace",
                "email": "not-an-email",
                "password": "Analytical1"
            }),
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "validation_error");
    assert_eq!(app.store.len().await, 0);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_are_identical() {
    let app = app();
    register(&app, "ada@example.com").await;

    let wrong_password = login(&app, "ada@example.com", "wrong").await;
    let unknown_email = login(&app, "nobody@example.com", "Analytical1").await;

    assert_eq!(wrong_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_malformed_login_body_fails_like_wrong_password() {
    let app = app();
    register(&app, "ada@example.com").await;
    let wrong_password = login(&app, "ada@example.com", "wrong").await;

    let bodies = [
        json!({ "email": "a@b.c" }),
        json!({ "email": "ada@example.com", "password": 42 }),
        json!([]),
    ];
    for body in bodies {
        let res = send(&app, post_json("/auth/login", body)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body, wrong_password.body);
        assert!(res.set_cookies.is_empty());
    }

    let not_json = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{email"))
        .unwrap();
    let res = send(&app, not_json).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, wrong_password.body);
}

#[tokio::test]
async fn test_malformed_register_body_is_validation_error() {
    let app = app();

    let missing_fields = send(
        &app,
        post_json("/auth/register", json!({ "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(missing_fields.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_fields.body["error"], "validation_error");
    assert_eq!(missing_fields.body["message"], "Invalid request body");

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .body(Body::from(register_body("ada@example.com").to_string()))
        .unwrap();
    let res = send(&app, no_content_type).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "validation_error");
    assert_eq!(app.store.len().await, 0);
}

#[tokio::test]
async fn test_me_without_credentials() {
    let app = app();
    let res = send(
        &app,
        Request::builder().uri("/auth/me").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "no_token");
    assert!(res.body.get("expired").is_none());
}

#[tokio::test]
async fn test_me_with_bearer_header() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;
    let token = registered.body["accessToken"].as_str().unwrap();

    let res = send(&app, me_with_bearer(token)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], registered.body["user"]["id"]);
    assert_eq!(res.body["email"], "ada@example.com");
    assert!(res.body.get("createdAt").is_some());
    assert!(res.body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_me_with_cookie() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;
    let token = registered.cookie_value("accessToken").unwrap();

    let res = send(
        &app,
        with_cookie("GET", "/auth/me", format!("accessToken={token}")),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], registered.body["user"]["id"]);
}

#[tokio::test]
async fn test_me_with_expired_token() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;
    let user_id = registered.body["user"]["id"].as_str().unwrap().parse().unwrap();

    let stale = app
        .auth
        .tokens()
        .issue_pair_at(user_id, Utc::now() - Duration::minutes(16))
        .unwrap();

    let res = send(&app, me_with_bearer(&stale.access_token)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["expired"], true);
    assert_eq!(res.body["message"], "Token expired");
}

#[tokio::test]
async fn test_me_with_invalid_token() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;

    // A refresh token is signed with the other secret
    let refresh = registered.body["refreshToken"].as_str().unwrap();
    let res = send(&app, me_with_bearer(refresh)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "invalid_token");
    assert!(res.body.get("expired").is_none());

    let res = send(&app, me_with_bearer("garbage")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "invalid_token");
}

#[tokio::test]
async fn test_me_for_deleted_user() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;
    let user_id = registered.body["user"]["id"].as_str().unwrap().parse().unwrap();
    app.store.remove(user_id).await;

    let res = send(
        &app,
        me_with_bearer(registered.body["accessToken"].as_str().unwrap()),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "user_not_found");
}

#[tokio::test]
async fn test_refresh_issues_new_independent_tokens() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;
    let old_access = registered.body["accessToken"].as_str().unwrap().to_string();
    let refresh = registered.cookie_value("refreshToken").unwrap();

    let res = send(
        &app,
        with_cookie("POST", "/auth/refresh-token", format!("refreshToken={refresh}")),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Token refreshed successfully");

    let new_access = res.body["accessToken"].as_str().unwrap();
    assert_ne!(new_access, old_access);
    assert_eq!(res.cookie_value("accessToken").as_deref(), Some(new_access));
    assert!(app.auth.tokens().verify(new_access, TokenKind::Access).is_ok());

    let me = send(&app, me_with_bearer(new_access)).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_ignores_authorization_header() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;
    let refresh = registered.body["refreshToken"].as_str().unwrap();

    let res = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/auth/refresh-token")
            .header(header::AUTHORIZATION, format!("Bearer {refresh}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Refresh token not found");
}

#[tokio::test]
async fn test_refresh_with_bad_tokens() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;
    let access = registered.body["accessToken"].as_str().unwrap();

    let res = send(
        &app,
        with_cookie("POST", "/auth/refresh-token", format!("refreshToken={access}")),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Invalid or expired refresh token");

    let user_id = registered.body["user"]["id"].as_str().unwrap().parse().unwrap();
    let stale = app
        .auth
        .tokens()
        .issue_pair_at(user_id, Utc::now() - Duration::days(7) - Duration::hours(1))
        .unwrap();
    let res = send(
        &app,
        with_cookie(
            "POST",
            "/auth/refresh-token",
            format!("refreshToken={}", stale.refresh_token),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Invalid or expired refresh token");
}

#[tokio::test]
async fn test_logout_clears_cookies_without_revoking_tokens() {
    let app = app();
    let registered = register(&app, "ada@example.com").await;
    let access = registered.body["accessToken"].as_str().unwrap().to_string();

    let res = send(&app, post_json("/auth/logout", json!({}))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Logged out successfully");

    for name in ["accessToken", "refreshToken"] {
        let cookie = res.cookie(name).unwrap();
        assert_eq!(res.cookie_value(name).as_deref(), Some(""));
        assert!(cookie.contains("Max-Age=0"), "{cookie}");
    }

    // Still valid: nothing is revoked server-side
    let me = send(&app, me_with_bearer(&access)).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_needs_no_credentials() {
    let app = app();
    let res = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_service_endpoints() {
    let app = app();

    let root = send(&app, Request::builder().uri("/").body(Body::empty()).unwrap()).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body, Value::String("Backend is running!".into()));

    let health = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(health.body["status"], "ok");
}

#[tokio::test]
async fn test_cors_reflects_origin_with_credentials() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/auth/login")
                .header(header::ORIGIN, "https://expenses.example.com")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://expenses.example.com"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

/// A credential store whose backend is unreachable
struct DownStore;

#[async_trait]
impl UserStore for DownStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database("connection refused".into()))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database("connection refused".into()))
    }

    async fn create(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Database("connection refused".into()))
    }

    async fn update(&self, _user: &User) -> Result<User, StoreError> {
        Err(StoreError::Database("connection refused".into()))
    }
}

#[tokio::test]
async fn test_store_failure_is_generic_server_error() {
    let auth = Arc::new(AuthService::new(
        Arc::new(DownStore),
        test_config(Environment::Development),
    ));
    let app = TestApp {
        router: build_router(auth.clone()),
        auth: auth.clone(),
        store: Arc::new(MemoryUserStore::new()),
    };
    let tokens = auth.tokens().issue_pair(Uuid::new_v4()).unwrap();
    let expected = json!({ "error": "internal_error", "message": "Server error" });

    let me = send(&app, me_with_bearer(&tokens.access_token)).await;
    assert_eq!(me.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(me.body, expected);

    let refresh = send(
        &app,
        with_cookie(
            "POST",
            "/auth/refresh-token",
            format!("refreshToken={}", tokens.refresh_token),
        ),
    )
    .await;
    assert_eq!(refresh.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(refresh.body, expected);
    assert!(refresh.set_cookies.is_empty());

    let logged_in = login(&app, "ada@example.com", "Analytical1").await;
    assert_eq!(logged_in.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(logged_in.body, expected);
}

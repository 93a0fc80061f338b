//! Integration test — start ephemeral PG, build router, drive the full
//! register/login/refresh lifecycle over HTTP.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use routine_api::{AppState, config::ApiConfig};
use routine_core::db::DbManager;

const JWT_SECRET: &str = "integration-test-secret";

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}

#[tokio::test]
async fn auth_flow_end_to_end() {
    // Spin up an ephemeral PostgreSQL instance.
    let mut db = DbManager::ephemeral().await.expect("DbManager::ephemeral");
    db.setup().await.expect("db setup");
    db.start().await.expect("db start");

    let pool = sqlx::PgPool::connect(&db.connection_url())
        .await
        .expect("connect to ephemeral PG");

    routine_api::migrate(&pool).await.expect("migrations");

    let state = AppState {
        pool: pool.clone(),
        config: ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: db.connection_url(),
            jwt_secret: JWT_SECRET.into(),
        },
    };
    let app = routine_api::router(state);

    // --- register -----------------------------------------------------
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "name": "Auth Test User",
            "email": "Auth_1@Test.com",
            "password": "cypress123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // Email is normalized to lowercase; the hash never appears.
    assert_eq!(body["email"], "auth_1@test.com");
    assert_eq!(body["name"], "Auth Test User");
    assert!(body.get("id").is_some());
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
    let user_id = body["id"].as_str().unwrap().to_string();

    // Duplicate email (any case) is a conflict.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "name": "Someone Else",
            "email": "auth_1@test.com",
            "password": "different-pw",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Short password is a validation error, not a conflict.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "name": "Short",
            "email": "short@test.com",
            "password": "short",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // --- login --------------------------------------------------------
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "auth_1@test.com",
            "password": "wrong-password",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Unknown email gets the exact same status as a wrong password.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "nobody@test.com",
            "password": "cypress123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({
            "email": "auth_1@test.com",
            "password": "cypress123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = body["access_token"].as_str().unwrap().to_string();
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["email"], "auth_1@test.com");
    assert_eq!(body["token_type"], "Bearer");

    // The access token's `sub` claim is the created user's id.
    let claims =
        routine_core::auth::jwt::verify_access_token(&access_token, JWT_SECRET.as_bytes())
            .expect("issued token verifies");
    assert_eq!(claims.sub, user_id);

    // --- guarded routes -----------------------------------------------
    let (status, body) = send(&app, "GET", "/api/users/me", Some(&access_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "auth_1@test.com");

    let (status, body) = send(&app, "GET", "/api/auth/profile", Some(&access_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.as_str());

    let (status, _) = send(&app, "GET", "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/tasks", Some("garbage-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A guarded resource route works with the token.
    let (status, body) = send(&app, "GET", "/api/tasks", Some(&access_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));

    // --- refresh (rotation) -------------------------------------------
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(serde_json::json!({ "refreshToken": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = body["access_token"].as_str().unwrap().to_string();
    let new_refresh = body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, refresh_token);
    assert_eq!(body["user"]["id"], user_id.as_str());

    // The refreshed access token passes the guard.
    let (status, body) = send(&app, "GET", "/api/users/me", Some(&new_access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "auth_1@test.com");

    // The rotated-out refresh token is dead.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(serde_json::json!({ "refreshToken": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // --- resource CRUD through the guard ------------------------------
    let (status, body) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&new_access),
        Some(serde_json::json!({
            "name": "Write integration tests",
            "priority": "URGENT_IMPORTANT",
            "category": "WORK",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["repetitionsCompleted"], 0);
    let task_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/tasks/{task_id}/complete"),
        Some(&new_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["repetitionsCompleted"], 1);

    // --- deleted user with a live token -------------------------------
    // The guard is stateless, so the signature still checks out; the
    // profile lookup is what must surface the missing record.
    routine_core::auth::queries::delete_user(&pool, &user_id)
        .await
        .expect("delete user");

    let (status, _) = send(&app, "GET", "/api/auth/profile", Some(&new_access), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // And the cascade killed the rotated refresh token too.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/refresh",
        None,
        Some(serde_json::json!({ "refreshToken": new_refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    db.stop().await.expect("db stop");
}

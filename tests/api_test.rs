//! End-to-end tests against the router, one fresh database per test.
//!
//! Covers:
//! - Signup, login, logout and the session cookie
//! - Post creation, feed order, drafts
//! - Ownership on update/delete
//! - Forged cookies and malformed bodies

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use parse::config::Config;
use parse::db;
use parse::routes;
use parse::state::{AppState, DbPool};

/// bcrypt's lowest accepted work factor; keeps signups fast.
const TEST_COST: u32 = 4;

struct TestApp {
    _tmp: TempDir,
    db: DbPool,
    router: Router,
}

struct Reply {
    status: StatusCode,
    set_cookie: Option<String>,
    location: Option<String>,
    body: Value,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.session_secret = Some("integration-test-secret-integration".to_string());
    config.auth.bcrypt_cost = TEST_COST;
    config
}

fn test_app() -> TestApp {
    let tmp = TempDir::new().unwrap();
    let pool = db::create_pool(&tmp.path().join("test.db")).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let state = AppState::new(test_config(), pool.clone()).unwrap();
    TestApp {
        _tmp: tmp,
        db: pool,
        router: routes::app(state),
    }
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let header_str = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let set_cookie = header_str(header::SET_COOKIE);
        let location = header_str(header::LOCATION);
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            set_cookie,
            location,
            body,
        }
    }

    async fn signup(&self, username: &str) -> String {
        let reply = self
            .call(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({
                    "username": username,
                    "password": "password123",
                    "displayName": username,
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        session_pair(&reply)
    }

    async fn publish(&self, cookie: &str, content: &str) -> String {
        let reply = self
            .call(
                Method::POST,
                "/api/posts/publish",
                Some(cookie),
                Some(json!({ "content": content })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.body["data"]["id"].as_str().unwrap().to_string()
    }
}

/// The `name=value` part of a Set-Cookie header, ready to send back.
fn session_pair(reply: &Reply) -> String {
    let set_cookie = reply.set_cookie.as_deref().expect("no Set-Cookie");
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn signup_login_post_and_ownership_scenario() {
    let app = test_app();

    // signup("alice", "password123", "Alice")
    let reply = app
        .call(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "username": "alice",
                "password": "password123",
                "displayName": "Alice",
            })),
        )
        .await;
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.body["data"]["username"], "alice");

    // login with the right password sets a session
    let reply = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "password123" })),
        )
        .await;
    assert_eq!(reply.body["success"], true);
    let set_cookie = reply.set_cookie.clone().unwrap();
    assert!(set_cookie.starts_with("parse_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=604800"));
    let alice = session_pair(&reply);

    // the wrong password does not
    let reply = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["error"], "Invalid username or password");
    assert!(reply.set_cookie.is_none());

    // alice publishes; it heads the feed
    app.publish(&alice, "an older post").await;
    let post_id = app.publish(&alice, "hello world").await;
    let reply = app.call(Method::GET, "/api/posts", None, None).await;
    assert_eq!(reply.body["data"][0]["id"], post_id.as_str());
    assert_eq!(reply.body["data"][0]["author"]["username"], "alice");

    // bob can't delete it
    let bob = app.signup("bob").await;
    let reply = app
        .call(Method::DELETE, &format!("/api/posts/{}", post_id), Some(&bob), None)
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"], "You can only delete your own posts");

    let reply = app
        .call(Method::GET, &format!("/api/posts/{}", post_id), None, None)
        .await;
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.body["data"]["content"], "hello world");
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let app = test_app();
    app.signup("alice").await;
    let reply = app
        .call(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "username": "alice",
                "password": "password123",
                "displayName": "Other Alice",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["error"], "Username already taken");
}

#[tokio::test]
async fn signup_validation_errors_are_uniform() {
    let app = test_app();
    let reply = app
        .call(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "username": "a b",
                "password": "password123",
                "displayName": "Spaces",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    assert_eq!(
        reply.body["error"],
        "Username can only contain letters, numbers, underscores, and periods"
    );
}

#[tokio::test]
async fn malformed_json_gets_the_uniform_shape() {
    let app = test_app();
    let reply = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "alice" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    assert!(reply.body["error"].is_string());
}

#[tokio::test]
async fn anonymous_writes_are_refused() {
    let app = test_app();
    let reply = app
        .call(
            Method::POST,
            "/api/posts",
            None,
            Some(json!({ "content": "hi" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"], "You must be logged in to create a post");

    let reply = app
        .call(Method::PATCH, "/api/posts/anything", None, Some(json!({})))
        .await;
    assert_eq!(reply.body["error"], "You must be logged in to update a post");

    let reply = app
        .call(Method::DELETE, "/api/posts/anything", None, None)
        .await;
    assert_eq!(reply.body["error"], "You must be logged in to delete a post");
}

#[tokio::test]
async fn forged_unsigned_cookie_is_anonymous() {
    let app = test_app();
    let alice = app.signup("alice").await;

    // base64 of {"personId":...,"username":"alice"} with no signature
    let reply = app.call(Method::GET, "/api/session", Some(&alice), None).await;
    let person_id = reply.body["data"]["personId"].as_str().unwrap().to_string();
    use base64::Engine;
    let forged = base64::engine::general_purpose::STANDARD
        .encode(json!({ "personId": person_id, "username": "alice" }).to_string());
    let forged_cookie = format!("parse_session={}", forged);

    let reply = app
        .call(Method::GET, "/api/session", Some(&forged_cookie), None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"], Value::Null);

    let reply = app
        .call(
            Method::POST,
            "/api/posts",
            Some(&forged_cookie),
            Some(json!({ "content": "impersonated" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_cookie_and_redirects() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let reply = app.call(Method::POST, "/auth/logout", Some(&alice), None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/login"));
    let cleared = reply.set_cookie.unwrap();
    assert!(cleared.starts_with("parse_session=;"));
    assert!(cleared.contains("Max-Age=0"));

    // Logging out twice is fine
    let reply = app.call(Method::POST, "/auth/logout", None, None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn drafts_stay_private_to_their_author() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let reply = app
        .call(
            Method::POST,
            "/api/posts",
            Some(&alice),
            Some(json!({ "content": "work in progress", "title": "WIP" })),
        )
        .await;
    assert_eq!(reply.body["data"]["isDraft"], true);
    assert_eq!(reply.body["data"]["title"], "WIP");

    let feed = app.call(Method::GET, "/api/posts", None, None).await;
    assert_eq!(feed.body["data"], json!([]));

    let mine = app.call(Method::GET, "/api/posts/drafts", Some(&alice), None).await;
    assert_eq!(mine.body["data"].as_array().unwrap().len(), 1);

    let theirs = app.call(Method::GET, "/api/posts/drafts", Some(&bob), None).await;
    assert_eq!(theirs.body["data"], json!([]));

    let anon = app.call(Method::GET, "/api/posts/drafts", None, None).await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owner_edits_and_others_cannot() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let post_id = app.publish(&alice, "first version").await;
    let uri = format!("/api/posts/{}", post_id);

    let reply = app
        .call(
            Method::PATCH,
            &uri,
            Some(&bob),
            Some(json!({ "content": "defaced" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"], "You can only edit your own posts");

    let reply = app
        .call(
            Method::PATCH,
            &uri,
            Some(&alice),
            Some(json!({ "content": "second version", "visibility": "private" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["content"], "second version");
    assert_eq!(reply.body["data"]["visibility"], "private");
    assert!(reply.body["data"]["lastModifiedAt"].is_string());

    let reply = app.call(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(reply.body, json!({ "success": true }));

    let reply = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "Post not found");
}

#[tokio::test]
async fn over_long_post_is_rejected_with_word_rule() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let long = vec!["word"; 101].join(" ");

    let check = app
        .call(
            Method::POST,
            "/api/validate/word-count",
            None,
            Some(json!({ "content": long })),
        )
        .await;
    assert_eq!(check.body["data"]["isValid"], false);
    assert_eq!(check.body["data"]["count"], 101);
    assert_eq!(
        check.body["data"]["message"],
        "101/100 words - please reduce by 1"
    );

    let reply = app
        .call(
            Method::POST,
            "/api/posts/publish",
            Some(&alice),
            Some(json!({ "content": long })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Post content must be 100 words or less");
}

#[tokio::test]
async fn people_pages() {
    let app = test_app();
    let alice = app.signup("alice").await;
    app.publish(&alice, "public one").await;
    app.call(
        Method::POST,
        "/api/posts/draft",
        Some(&alice),
        Some(json!({ "content": "hidden" })),
    )
    .await;

    let profile = app.call(Method::GET, "/api/people/alice", None, None).await;
    assert_eq!(profile.body["data"]["username"], "alice");
    assert!(profile.body["data"].get("accountId").is_none());

    let posts = app
        .call(Method::GET, "/api/people/alice/posts", None, None)
        .await;
    let list = posts.body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["content"], "public one");

    let missing = app.call(Method::GET, "/api/people/nobody/posts", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "Person not found");
}

#[tokio::test]
async fn feed_paginates() {
    let app = test_app();
    let alice = app.signup("alice").await;
    for n in 0..5 {
        app.publish(&alice, &format!("post {}", n)).await;
    }
    let reply = app
        .call(Method::GET, "/api/posts?limit=2&offset=1", None, None)
        .await;
    let list = reply.body["data"].as_array().unwrap();
    let contents: Vec<_> = list.iter().map(|p| p["content"].as_str().unwrap()).collect();
    assert_eq!(contents, ["post 3", "post 2"]);
}

#[tokio::test]
async fn health_is_plain_ok() {
    let app = test_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn bad_paging_params_get_the_uniform_shape() {
    let app = test_app();
    for uri in ["/api/posts?limit=abc", "/api/posts?limit=-1", "/api/posts?offset=x"] {
        let reply = app.call(Method::GET, uri, None, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(reply.body["success"], false, "{}", uri);
        assert!(reply.body["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn session_for_deleted_account_cannot_post() {
    let app = test_app();
    let alice = app.signup("alice").await;

    app.db
        .get()
        .unwrap()
        .execute("DELETE FROM accounts", [])
        .unwrap();

    let reply = app
        .call(
            Method::POST,
            "/api/posts",
            Some(&alice),
            Some(json!({ "content": "still here?" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], false);
    assert_eq!(
        reply.body["error"],
        "Your account no longer exists, please log in again"
    );
}

#[test]
fn absurd_session_lifetime_is_refused_at_startup() {
    let tmp = TempDir::new().unwrap();
    let pool = db::create_pool(&tmp.path().join("test.db")).unwrap();
    let mut config = test_config();
    config.auth.session_days = u64::MAX;
    assert!(AppState::new(config, pool).is_err());
}

#[tokio::test]
async fn long_passwords_are_refused_at_signup() {
    let app = test_app();
    let reply = app
        .call(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({
                "username": "alice",
                "password": "p".repeat(73),
                "displayName": "Alice",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Password must be 72 bytes or less");
}

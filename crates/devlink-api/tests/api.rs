use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::Path,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
    middleware::{self, Next},
    routing::get,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use devlink_api::config::Config;
use devlink_api::state::AppStateInner;
use devlink_api::token::{TOKEN_TTL_SECS, TokenKeys};
use devlink_db::Database;

fn test_config() -> Config {
    Config {
        // Lowest cost bcrypt accepts; keeps the suite fast.
        bcrypt_cost: 4,
        ..Config::default()
    }
}

fn app_with(config: Config) -> Router {
    let db = Database::open_in_memory().unwrap();
    devlink_api::router(AppStateInner::new(db, config).unwrap())
}

fn app() -> Router {
    app_with(test_config())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-auth-token", token);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    send_request(app, builder.body(body).unwrap()).await
}

async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "name": name, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

async fn user_id(app: &Router, token: &str) -> String {
    let (status, body) = send(app, Method::GET, "/api/auth", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

async fn create_post(app: &Router, token: &str, text: &str) -> Value {
    let (status, post) = send(
        app,
        Method::POST,
        "/api/posts",
        Some(token),
        Some(json!({ "text": text })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    post
}

async fn create_profile(app: &Router, token: &str) -> Value {
    let (status, profile) = send(
        app,
        Method::POST,
        "/api/profile",
        Some(token),
        Some(json!({ "status": "Developer", "skills": "rust, sql" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    profile
}

fn first_error(body: &Value) -> &str {
    body["errors"][0]["msg"].as_str().unwrap()
}

// -- Users & auth --

#[tokio::test]
async fn register_like_and_unlike_end_to_end() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    let bob = register(&app, "Bob", "b@x.com", "secret2").await;
    let bob_id = user_id(&app, &bob).await;

    let post = create_post(&app, &ann, "hello").await;
    assert_eq!(post["text"], "hello");
    assert_eq!(post["name"], "Ann");
    assert_eq!(post["likes"], json!([]));
    assert_eq!(post["comments"], json!([]));
    let post_id = post["id"].as_str().unwrap();

    let (status, likes) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/like/{post_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(likes, json!([{ "user": bob_id }]));

    let (status, likes) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/unlike/{post_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(likes, json!([]));
}

#[tokio::test]
async fn duplicate_email_is_rejected_without_second_record() {
    let app = app();
    register(&app, "Ann", "a@x.com", "secret1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "name": "Impostor", "email": "a@x.com", "password": "other-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error(&body), "User already exists");

    // The original account and password are untouched.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth",
        None,
        Some(json!({ "email": "a@x.com", "password": "other-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth",
        None,
        Some(json!({ "email": "a@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn email_uniqueness_ignores_case() {
    let app = app();
    register(&app, "Ann", "a@x.com", "secret1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "name": "Ann Again", "email": "A@X.COM", "password": "other-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error(&body), "User already exists");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth",
        None,
        Some(json!({ "email": "A@x.Com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn registration_reports_every_invalid_field() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "name": "", "email": "not-an-email", "password": "123" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<_> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["name", "email", "password"]);
}

#[tokio::test]
async fn login_token_identifies_the_user() {
    let app = app();
    register(&app, "Ann", "a@x.com", "secret1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth",
        None,
        Some(json!({ "email": "a@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let identity = TokenKeys::new(&test_config().jwt_secret).verify(token).unwrap();
    assert_eq!(identity.id.to_string(), user_id(&app, token).await);

    let (status, me) = send(&app, Method::GET, "/api/auth", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "a@x.com");
    assert!(me.get("password").is_none());
}

#[tokio::test]
async fn bad_credentials_share_one_message() {
    let app = app();
    register(&app, "Ann", "a@x.com", "secret1").await;

    let (status, wrong_password) = send(
        &app,
        Method::POST,
        "/api/auth",
        None,
        Some(json!({ "email": "a@x.com", "password": "nope-nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, unknown_email) = send(
        &app,
        Method::POST,
        "/api/auth",
        None,
        Some(json!({ "email": "ghost@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(first_error(&wrong_password), "Invalid Credentials");
    assert_eq!(wrong_password, unknown_email);
}

// -- Authorization gate --

#[tokio::test]
async fn gate_rejects_missing_and_invalid_tokens() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body), "No token, authorization denied");

    let (status, body) = send(&app, Method::GET, "/api/posts", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body), "Token is not valid");

    let foreign = TokenKeys::new("some-other-secret").issue(Uuid::new_v4()).unwrap();
    let (status, _) = send(&app, Method::GET, "/api/posts", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn gate_rejects_expired_tokens() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    let id: Uuid = user_id(&app, &ann).await.parse().unwrap();

    let keys = TokenKeys::new(&test_config().jwt_secret);
    let expired = keys
        .issue_at(id, Utc::now() - Duration::seconds(TOKEN_TTL_SECS + 1))
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/api/auth", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body), "Token is not valid");
}

#[tokio::test]
async fn unreadable_bodies_use_the_error_envelope() {
    let app = app();

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": \"Ann\","))
        .unwrap();
    let (status, body) = send_request(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!first_error(&body).is_empty());

    let untyped = Request::builder()
        .method(Method::POST)
        .uri("/api/auth")
        .body(Body::from(r#"{"email":"a@x.com","password":"secret1"}"#))
        .unwrap();
    let (status, body) = send_request(&app, untyped).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(!first_error(&body).is_empty());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "name": 42, "email": "a@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!first_error(&body).is_empty());
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body), "Not found");

    // Comment routes are plural: /api/posts/comments/...
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/posts/comment/{}", Uuid::new_v4()),
        None,
        Some(json!({ "text": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_routes_need_no_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/profile", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

// -- Posts --

#[tokio::test]
async fn liking_twice_conflicts_and_keeps_one_like() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    let post = create_post(&app, &ann, "hello").await;
    let uri = format!("/api/posts/like/{}", post["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::PUT, &uri, Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::PUT, &uri, Some(&ann), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error(&body), "Post already liked");

    let (_, stored) = send(
        &app,
        Method::GET,
        &format!("/api/posts/{}", post["id"].as_str().unwrap()),
        Some(&ann),
        None,
    )
    .await;
    assert_eq!(stored["likes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unliking_an_unliked_post_is_not_found() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    let bob = register(&app, "Bob", "b@x.com", "secret2").await;
    let post = create_post(&app, &ann, "hello").await;
    let id = post["id"].as_str().unwrap();

    send(&app, Method::PUT, &format!("/api/posts/like/{id}"), Some(&ann), None).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/unlike/{id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body), "Post has not yet been liked");

    let (_, stored) = send(&app, Method::GET, &format!("/api/posts/{id}"), Some(&ann), None).await;
    assert_eq!(stored["likes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_the_author_can_delete_a_post() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    let bob = register(&app, "Bob", "b@x.com", "secret2").await;
    let post = create_post(&app, &ann, "hello").await;
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Post removed");

    let (status, _) = send(&app, Method::GET, &uri, Some(&ann), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_and_unknown_post_ids_are_not_found() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;

    let (status, _) = send(&app, Method::GET, "/api/posts/not-an-id", Some(&ann), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/posts/like/{}", Uuid::new_v4()),
        Some(&ann),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn posts_are_listed_newest_first() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    create_post(&app, &ann, "first").await;
    create_post(&app, &ann, "second").await;

    let (status, posts) = send(&app, Method::GET, "/api/posts", Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = posts
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["second", "first"]);
}

#[tokio::test]
async fn comment_removal_targets_the_comment_id() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    let bob = register(&app, "Bob", "b@x.com", "secret2").await;
    let post = create_post(&app, &ann, "hello").await;
    let id = post["id"].as_str().unwrap();
    let comment_uri = format!("/api/posts/comments/{id}");

    let (status, body) = send(
        &app,
        Method::POST,
        &comment_uri,
        Some(&bob),
        Some(json!({ "text": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_error(&body), "Text is required");

    send(&app, Method::POST, &comment_uri, Some(&bob), Some(json!({ "text": "older" }))).await;
    let (status, comments) = send(
        &app,
        Method::POST,
        &comment_uri,
        Some(&bob),
        Some(json!({ "text": "newer" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comments[0]["text"], "newer");
    assert_eq!(comments[0]["name"], "Bob");
    let older_id = comments[1]["id"].as_str().unwrap().to_string();

    // Post author cannot remove someone else's comment.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{comment_uri}/{older_id}"),
        Some(&ann),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Removing the older comment leaves the newer one, even though the
    // newer one is Bob's first in list order.
    let (status, comments) = send(
        &app,
        Method::DELETE,
        &format!("{comment_uri}/{older_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comments.as_array().unwrap().len(), 1);
    assert_eq!(comments[0]["text"], "newer");

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("{comment_uri}/{older_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body), "Comment does not exist");
}

// -- Profiles --

#[tokio::test]
async fn profile_upsert_creates_then_partially_updates() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    let ann_id = user_id(&app, &ann).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/profile",
        Some(&ann),
        Some(json!({ "skills": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "status");

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/profile",
        Some(&ann),
        Some(json!({
            "status": "Developer",
            "skills": " rust , sql,go ",
            "company": "Acme",
            "twitter": "https://twitter.com/ann",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["skills"], json!(["rust", "sql", "go"]));
    assert_eq!(created["user"], ann_id);

    let (status, updated) = send(
        &app,
        Method::POST,
        "/api/profile",
        Some(&ann),
        Some(json!({
            "status": "Senior Developer",
            "skills": "rust",
            "youtube": "https://youtube.com/ann",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["status"], "Senior Developer");
    assert_eq!(updated["company"], "Acme");
    assert_eq!(updated["social"]["twitter"], "https://twitter.com/ann");
    assert_eq!(updated["social"]["youtube"], "https://youtube.com/ann");

    let (status, mine) = send(&app, Method::GET, "/api/profile/me", Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["user"]["name"], "Ann");

    let (status, public) = send(
        &app,
        Method::GET,
        &format!("/api/profile/user/{ann_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["status"], "Senior Developer");

    let (_, all) = send(&app, Method::GET, "/api/profile", None, None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_profiles_are_not_found() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;

    let (status, body) = send(&app, Method::GET, "/api/profile/me", Some(&ann), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body), "There is no profile for this user");

    let (status, _) = send(&app, Method::GET, "/api/profile/user/12345", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/profile/experience",
        Some(&ann),
        Some(json!({ "title": "Dev", "company": "Acme", "from": "2020-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn experience_is_removed_by_id_and_others_keep_order() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    create_profile(&app, &ann).await;

    let mut profile = Value::Null;
    for title in ["Intern", "Developer", "Lead"] {
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/profile/experience",
            Some(&ann),
            Some(json!({ "title": title, "company": "Acme", "from": "2020-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        profile = body;
    }
    let titles = |p: &Value| -> Vec<String> {
        p["experience"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(titles(&profile), ["Lead", "Developer", "Intern"]);

    let middle = profile["experience"][1]["id"].as_str().unwrap();
    let (status, profile) = send(
        &app,
        Method::DELETE,
        &format!("/api/profile/experience/{middle}"),
        Some(&ann),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&profile), ["Lead", "Intern"]);

    // An unknown id must not remove the last entry.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/profile/experience/{}", Uuid::new_v4()),
        Some(&ann),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, mine) = send(&app, Method::GET, "/api/profile/me", Some(&ann), None).await;
    assert_eq!(titles(&mine), ["Lead", "Intern"]);
}

#[tokio::test]
async fn education_add_validates_and_removes_by_id() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    create_profile(&app, &ann).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/profile/education",
        Some(&ann),
        Some(json!({ "school": "MIT", "degree": "BSc", "from": "2010-09-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "fieldOfStudy");

    let (status, profile) = send(
        &app,
        Method::PUT,
        "/api/profile/education",
        Some(&ann),
        Some(json!({
            "school": "MIT",
            "degree": "BSc",
            "fieldOfStudy": "CS",
            "from": "2010-09-01",
            "current": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["education"][0]["fieldOfStudy"], "CS");
    assert_eq!(profile["education"][0]["current"], true);

    let edu_id = profile["education"][0]["id"].as_str().unwrap();
    let (status, profile) = send(
        &app,
        Method::DELETE,
        &format!("/api/profile/education/{edu_id}"),
        Some(&ann),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["education"], json!([]));
}

#[tokio::test]
async fn deleting_the_account_removes_profile_posts_and_user() {
    let app = app();
    let ann = register(&app, "Ann", "a@x.com", "secret1").await;
    let bob = register(&app, "Bob", "b@x.com", "secret2").await;
    let ann_id = user_id(&app, &ann).await;
    create_profile(&app, &ann).await;
    let post = create_post(&app, &ann, "bye").await;

    let (status, body) = send(&app, Method::DELETE, "/api/profile", Some(&ann), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "User deleted");

    let (status, _) = send(&app, Method::GET, "/api/auth", Some(&ann), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/profile/user/{ann_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/posts/{}", post["id"].as_str().unwrap()),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The email is free again.
    register(&app, "Ann", "a@x.com", "secret1").await;
}

// -- GitHub --

type SeenPaths = Arc<Mutex<Vec<String>>>;

/// Local stand-in for the GitHub API that records every request it receives.
async fn stub_github() -> (String, SeenPaths) {
    let seen = SeenPaths::default();
    let recorder = seen.clone();

    let stub = Router::new()
        .route(
            "/users/{name}/repos",
            get(|Path(name): Path<String>| async move {
                if name == "octocat" {
                    Ok(Json(json!([{ "name": "hello-world", "stargazers_count": 42 }])))
                } else {
                    Err(StatusCode::NOT_FOUND)
                }
            }),
        )
        .route("/rate_limit", get(|| async { Json(json!({ "rate": { "limit": 5000 } })) }))
        .layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(req.uri().to_string());
                next.run(req).await
            }
        }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

#[tokio::test]
async fn github_repos_are_passed_through() {
    let (api_url, seen) = stub_github().await;
    let app = app_with(Config {
        github_api_url: api_url,
        ..test_config()
    });

    let (status, body) = send(&app, Method::GET, "/api/profile/github/octocat", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "name": "hello-world", "stargazers_count": 42 }]));

    let (status, body) = send(&app, Method::GET, "/api/profile/github/nobody", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body), "No Github profile found");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].starts_with("/users/octocat/repos?per_page=5&sort=created"));
}

#[tokio::test]
async fn github_username_cannot_escape_the_repos_path() {
    let (api_url, seen) = stub_github().await;
    let app = app_with(Config {
        github_api_url: api_url,
        github_client_id: Some("client-id".into()),
        github_client_secret: Some("client-secret".into()),
        ..test_config()
    });

    for name in ["x%2F..%2F..%2Frate_limit%3F", "octocat%23frag", "octo%20cat", "-octocat"] {
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/profile/github/{name}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{name}");
        assert_eq!(first_error(&body), "No Github profile found");
    }

    let paths = seen.lock().unwrap().clone();
    assert!(paths.is_empty(), "stub was called: {paths:?}");
}

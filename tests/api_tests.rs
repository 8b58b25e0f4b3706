use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use bugtracker::api::AppState;
use bugtracker::config::Config;
use bugtracker::db::BugWrite;
use bugtracker::domain::events::{Collection, EditEvent, EditOp};
use bugtracker::domain::{BugStatus, ObjectId, UserRole, time};
use bugtracker::models::{BugChanges, NewBug, UserChanges};
use bugtracker::services::UserService;
use http_body_util::BodyExt;
use sea_orm::ConnectionTrait;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORD: &str = "correct horse battery";

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.url = format!("sqlite://{}", dir.path().display());
    config.database.name = "bugtracker-test".to_string();
    config.security.jwt_secret = "test-secret".to_string();
    config.security.hash_rounds = 1;
    config.security.argon2_memory_cost_kib = 1024;
    config.server.secure_cookies = false;
    config
}

/// Builds the app over a fresh database. The database lives as long as the returned `TempDir`.
async fn spawn_app() -> (Router, Arc<AppState>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let state = bugtracker::api::create_app_state_from_config(test_config(&dir), None)
        .await
        .expect("Failed to create app state");
    (bugtracker::api::router(state.clone()), state, dir)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

/// Registers an account and returns `(token, user id)`.
async fn register(app: &Router, email: &str, given_name: &str) -> (String, String) {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": PASSWORD,
            "givenName": given_name,
            "familyName": "Tester",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");

    (
        body["data"]["token"].as_str().unwrap().to_string(),
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
    )
}

async fn login(app: &Router, email: &str) -> String {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Changes a role directly in the store and signs in again to pick it up.
async fn promote(app: &Router, state: &AppState, id: &str, email: &str, role: UserRole) -> String {
    let id = ObjectId::parse_str(id).unwrap();
    let changes = UserChanges {
        role: Some(role),
        ..UserChanges::default()
    };
    let event = EditEvent::new(Collection::User, EditOp::Update, id);
    state
        .store()
        .users()
        .update(id, &changes, &time::now(), &event)
        .await
        .unwrap();
    login(app, email).await
}

async fn report_bug(app: &Router, token: &str, title: &str) -> String {
    file_bug(app, token, title, "Something went wrong", "1. Open 2. Save").await
}

async fn file_bug(app: &Router, token: &str, title: &str, description: &str, steps: &str) -> String {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/api/bugs",
        Some(token),
        Some(json!({
            "title": title,
            "description": description,
            "stepsToReproduce": steps,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create bug failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_sets_session_cookie() {
    let (app, _, _db) = spawn_app().await;

    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "  Ada@Example.COM ",
            "password": PASSWORD,
            "givenName": "Ada",
            "familyName": "Lovelace",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert_eq!(body["data"]["user"]["roles"], json!(["User"]));
    assert_eq!(body["data"]["expiresIn"], 3600);

    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with("authToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=3600"));
    assert!(!cookie.contains("Secure"));

    let session = cookie.split(';').next().unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (app, _, _db) = spawn_app().await;
    register(&app, "grace@example.com", "Grace").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": "GRACE@example.com",
            "password": PASSWORD,
            "givenName": "Grace",
            "familyName": "Hopper",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn login_checks_credentials() {
    let (app, _, _db) = spawn_app().await;
    register(&app, "linus@example.com", "Linus").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "linus@example.com", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    login(&app, " Linus@Example.com").await;
}

#[tokio::test]
async fn missing_fields_are_all_reported() {
    let (app, _, _db) = spawn_app().await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "ada@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let paths: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["familyName", "givenName", "password"]);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (app, _, _db) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let (app, _, _db) = spawn_app().await;

    let (status, _, body) = send(&app, Method::GET, "/api/bugs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "You must be logged in");

    let (status, _, _) = send(&app, Method::GET, "/api/bugs", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_ids_are_rejected_before_lookup() {
    let (app, _, _db) = spawn_app().await;
    let (token, _) = register(&app, "ids@example.com", "Ida").await;

    let (status, _, body) = send(&app, Method::GET, "/api/users/123", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId is not a valid ObjectId");

    let missing = ObjectId::new().to_hex();
    let (status, _, _) = send(
        &app,
        Method::GET,
        &format!("/api/users/{missing}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_are_paginated() {
    let (app, _, _db) = spawn_app().await;
    let mut token = String::new();
    for i in 0..7 {
        token = register(&app, &format!("user{i}@example.com"), &format!("User{i}"))
            .await
            .0;
    }

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/api/users?pageSize=5&pageNumber=2&sortBy=givenName",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalUsers"], 7);
    assert_eq!(data["totalPages"], 2);
    assert_eq!(data["pageNumber"], 2);
    assert_eq!(data["pageSize"], 5);
    let users = data["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["givenName"], "User5");
    assert!(users[0].get("password").is_none());

    let (_, _, body) = send(
        &app,
        Method::GET,
        "/api/users?pageSize=abc&keywords=USER3",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["pageSize"], 5);
    assert_eq!(body["data"]["totalUsers"], 1);
}

#[tokio::test]
async fn users_edit_only_themselves() {
    let (app, _, _db) = spawn_app().await;
    let (token, id) = register(&app, "self@example.com", "Self").await;
    let (_, other) = register(&app, "other@example.com", "Other").await;

    let (status, _, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{id}"),
        Some(&token),
        Some(json!({ "givenName": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullName"], "Renamed Tester");

    let (status, _, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{other}"),
        Some(&token),
        Some(json!({ "givenName": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{id}"),
        Some(&token),
        Some(json!({ "role": "Technical Manager" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_users_needs_the_manager_role() {
    let (app, state, _db) = spawn_app().await;
    let (token, _) = register(&app, "boss@example.com", "Boss").await;
    let (_, victim) = register(&app, "victim@example.com", "Victim").await;
    let uri = format!("/api/users/{victim}");

    let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let boss = register(&app, "tm@example.com", "Manager").await.1;
    let token = promote(&app, &state, &boss, "tm@example.com", UserRole::TechnicalManager).await;

    let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bug_lifecycle() {
    let (app, state, _db) = spawn_app().await;
    let (reporter, _) = register(&app, "reporter@example.com", "Reporter").await;
    let bug_id = report_bug(&app, &reporter, "Save button crashes").await;
    let uri = format!("/api/bugs/{bug_id}");

    let (status, _, body) = send(&app, Method::GET, &uri, Some(&reporter), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "open");
    assert_eq!(body["data"]["classification"], "unclassified");
    assert_eq!(body["data"]["createdByName"], "Reporter Tester");

    let (status, _, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/status"),
        Some(&reporter),
        Some(json!({ "status": "inProgress" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "inProgress");

    // Closing takes canCloseAnyBug
    let (status, _, _) = send(&app, Method::PATCH, &format!("{uri}/close"), Some(&reporter), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let analyst_id = register(&app, "ba@example.com", "Analyst").await.1;
    let analyst = promote(&app, &state, &analyst_id, "ba@example.com", UserRole::BusinessAnalyst).await;

    let (status, _, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/classify"),
        Some(&analyst),
        Some(json!({ "classification": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["classification"], "approved");
    assert!(body["data"]["classifiedOn"].is_string());

    let (status, _, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/assign"),
        Some(&analyst),
        Some(json!({ "assignedToId": analyst_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assignedToName"], "Analyst Tester");

    let (status, _, body) = send(&app, Method::PATCH, &format!("{uri}/close"), Some(&analyst), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "closed");
    assert_eq!(body["data"]["closedById"], analyst_id);

    let (status, _, _) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/status"),
        Some(&analyst),
        Some(json!({ "status": "inProgress" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        Method::PATCH,
        &format!("{uri}/status"),
        Some(&analyst),
        Some(json!({ "status": "open" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["closedOn"].is_null());

    let (status, _, body) = send(&app, Method::GET, &format!("{uri}/history"), Some(&analyst), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn bugs_are_filtered_and_paginated() {
    let (app, _, _db) = spawn_app().await;
    let (token, _) = register(&app, "lister@example.com", "Lister").await;
    for (title, description, steps) in [
        ("Alpha crash", "Window closes", "1. Open"),
        ("Beta typo", "Label misspelt", "1. Read the label"),
        ("Gamma crash", "App exits", "1. Save"),
        ("Delta freeze", "UI hangs, then CRASHES", "1. Click"),
        ("Epsilon glitch", "Flicker", "Resize until it crashes"),
    ] {
        file_bug(&app, &token, title, description, steps).await;
    }

    let titles = |body: &Value| -> Vec<String> {
        body["data"]["bugs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/api/bugs?keywords=CRASH&sortBy=title&status=open",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalBugs"], 4);
    assert_eq!(
        titles(&body),
        vec!["Alpha crash", "Delta freeze", "Epsilon glitch", "Gamma crash"]
    );

    let (_, _, body) = send(&app, Method::GET, "/api/bugs?keywords=misspelt", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Beta typo"]);

    let (_, _, body) = send(&app, Method::GET, "/api/bugs?keywords=RESIZE", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Epsilon glitch"]);

    let (_, _, body) = send(
        &app,
        Method::GET,
        "/api/bugs?keywords=crash&sortBy=title&pageSize=3&pageNumber=2",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(titles(&body), vec!["Gamma crash"]);

    let (_, _, body) = send(&app, Method::GET, "/api/bugs?minAge=1", Some(&token), None).await;
    assert_eq!(body["data"]["totalBugs"], 0);
}

#[tokio::test]
async fn age_window_bounds_both_ends() {
    let (app, state, _db) = spawn_app().await;
    let (token, reporter) = register(&app, "ages@example.com", "Ages").await;
    report_bug(&app, &token, "Fresh bug").await;

    let old = NewBug {
        id: ObjectId::new(),
        title: "Stale bug".to_string(),
        description: "Reported long ago".to_string(),
        steps_to_reproduce: String::new(),
        created_on: time::format_timestamp(chrono::Utc::now() - chrono::Duration::days(10)),
        created_by_id: ObjectId::parse_str(&reporter).unwrap(),
        created_by_name: "Ages Tester".to_string(),
    };
    let event = EditEvent::new(Collection::Bug, EditOp::Insert, old.id);
    state.store().bugs().insert(old, &event).await.unwrap();

    let titles = |body: &Value| -> Vec<String> {
        body["data"]["bugs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap().to_string())
            .collect()
    };

    // maxAge floors the creation date
    let (_, _, body) = send(&app, Method::GET, "/api/bugs?maxAge=5", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Fresh bug"]);

    // minAge caps it
    let (_, _, body) = send(&app, Method::GET, "/api/bugs?minAge=5", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Stale bug"]);

    let (_, _, body) = send(
        &app,
        Method::GET,
        "/api/bugs?minAge=5&maxAge=9",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["totalBugs"], 0);

    let (_, _, body) = send(&app, Method::GET, "/api/bugs?maxAge=30", Some(&token), None).await;
    assert_eq!(body["data"]["totalBugs"], 2);
}

#[tokio::test]
async fn out_of_range_paging_falls_back_to_defaults() {
    let (app, _, _db) = spawn_app().await;
    let (token, _) = register(&app, "paging@example.com", "Paging").await;

    for uri in [
        "/api/users?pageSize=18446744073709551615",
        "/api/users?pageNumber=18446744073709551615",
        "/api/users?pageSize=100&pageNumber=9223372036854775807",
        "/api/bugs?pageSize=9223372036854775808",
    ] {
        let (status, _, body) = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{uri}: {body}");
        assert_eq!(body["data"]["pageNumber"], 1, "{uri}");
    }

    let (_, _, body) = send(
        &app,
        Method::GET,
        "/api/users?pageSize=18446744073709551615",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["pageSize"], 5);
    assert_eq!(body["data"]["totalUsers"], 1);
}

#[tokio::test]
async fn keywords_match_literally_and_ignore_case() {
    let (app, _, _db) = spawn_app().await;
    register(&app, "ann@example.com", "Ann").await;
    register(&app, "bob@example.com", "Bob").await;
    let (token, _) = register(&app, "emile@example.com", "Émile").await;

    let total = |uri: String| {
        let app = app.clone();
        let token = token.clone();
        async move {
            let (status, _, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK, "{uri}: {body}");
            body["data"]["totalUsers"].clone()
        }
    };

    assert_eq!(total("/api/users?keywords=%25".to_string()).await, 0);
    assert_eq!(total("/api/users?keywords=_".to_string()).await, 0);
    assert_eq!(total("/api/users?keywords=%C3%A9mile".to_string()).await, 1);
    assert_eq!(total("/api/users?keywords=%C3%89MILE".to_string()).await, 1);
    assert_eq!(total("/api/users?keywords=TESTER".to_string()).await, 3);
}

#[tokio::test]
async fn users_are_filtered_by_role() {
    let (app, state, _db) = spawn_app().await;
    let (token, _) = register(&app, "plain@example.com", "Plain").await;
    let qa = register(&app, "qa@example.com", "Quinn").await.1;
    promote(&app, &state, &qa, "qa@example.com", UserRole::QualityAnalyst).await;

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/api/users?role=Quality%20Analyst",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalUsers"], 1);
    assert_eq!(body["data"]["users"][0]["id"], qa);

    let (_, _, body) = send(&app, Method::GET, "/api/users?role=User", Some(&token), None).await;
    assert_eq!(body["data"]["totalUsers"], 1);
    assert_eq!(body["data"]["users"][0]["givenName"], "Plain");
}

#[tokio::test]
async fn registered_users_are_found_by_email() {
    let (app, state, _db) = spawn_app().await;
    let (_, id) = register(&app, "Mixed.Case@Example.com", "Mixed").await;

    let user = state
        .user_service()
        .get_by_email("  MIXED.case@example.COM ")
        .await
        .unwrap()
        .expect("registered user");
    assert_eq!(user.id.to_hex(), id);
    assert_eq!(user.email, "mixed.case@example.com");

    assert!(
        state
            .user_service()
            .get_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn legacy_passwords_are_rehashed_on_login() {
    let (app, state, _db) = spawn_app().await;
    let (_, id) = register(&app, "legacy@example.com", "Legacy").await;
    let users = state.store().users();

    users
        .update_password(ObjectId::parse_str(&id).unwrap(), "plain-text-secret".to_string())
        .await
        .unwrap();

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "legacy@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for _ in 0..2 {
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "legacy@example.com", "password": "plain-text-secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");

        let stored = users.get_by_email("legacy@example.com").await.unwrap().unwrap();
        assert!(stored.password.starts_with("$argon2id$"));
    }
}

#[tokio::test]
async fn failed_audit_writes_roll_back_the_mutation() {
    let (app, state, _db) = spawn_app().await;
    state
        .store()
        .conn
        .execute_unprepared("DROP TABLE edits")
        .await
        .unwrap();

    let request = json!({
        "email": "atomic@example.com",
        "password": PASSWORD,
        "givenName": "Atomic",
        "familyName": "Tester",
    });

    for _ in 0..2 {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(request.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    assert!(
        state
            .user_service()
            .get_by_email("atomic@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn stale_status_writes_are_refused() {
    let (app, state, _db) = spawn_app().await;
    let (token, reporter) = register(&app, "racer@example.com", "Racer").await;
    let bug_id = report_bug(&app, &token, "Racy bug").await;
    let id = ObjectId::parse_str(&bug_id).unwrap();
    let editor = ObjectId::parse_str(&reporter).unwrap();

    // Validated against `inProgress`, but the bug is still open
    let changes = BugChanges {
        status: Some(BugStatus::Closed),
        ..BugChanges::default()
    };
    let event = EditEvent::new(Collection::Bug, EditOp::Transition, id).by(editor);
    let written = state
        .store()
        .bugs()
        .update(id, &changes, Some(BugStatus::InProgress), &time::now(), editor, &event)
        .await
        .unwrap();
    assert!(matches!(written, BugWrite::StatusChanged));

    let written = state
        .store()
        .bugs()
        .update(ObjectId::new(), &changes, Some(BugStatus::Open), &time::now(), editor, &event)
        .await
        .unwrap();
    assert!(matches!(written, BugWrite::NotFound));

    let uri = format!("/api/bugs/{bug_id}");
    let (_, _, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(body["data"]["status"], "open");

    let (_, _, body) = send(&app, Method::GET, &format!("{uri}/history"), Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let written = state
        .store()
        .bugs()
        .update(id, &changes, Some(BugStatus::Open), &time::now(), editor, &event)
        .await
        .unwrap();
    assert!(matches!(written, BugWrite::Saved(ref bug) if bug.status == BugStatus::Closed));
}

#[tokio::test]
async fn comments_on_bugs() {
    let (app, _, _db) = spawn_app().await;
    let (token, _) = register(&app, "commenter@example.com", "Commenter").await;
    let bug_id = report_bug(&app, &token, "Needs discussion").await;
    let uri = format!("/api/bugs/{bug_id}/comments");

    let (status, _, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "content": "  Seen on Linux too  " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "Seen on Linux too");
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _, body) = send(
        &app,
        Method::GET,
        &format!("{uri}/{comment_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["authorName"], "Commenter Tester");

    let (status, _, body) = send(&app, Method::GET, &format!("{uri}/nope"), Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "commentId is not a valid ObjectId");

    let missing_bug = ObjectId::new().to_hex();
    let (status, _, _) = send(
        &app,
        Method::GET,
        &format!("/api/bugs/{missing_bug}/comments"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_spa_fallback() {
    let (app, _, _db) = spawn_app().await;

    let (status, _, body) = send(&app, Method::GET, "/api/system/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checks"]["database"], true);

    let (status, _, body) = send(&app, Method::GET, "/api/does-not-exist", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/bugs/some/client/route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert_eq!(content_type, "text/html");
}

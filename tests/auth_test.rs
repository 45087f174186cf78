mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};
use time::macros::date;

use common::{Factory, TestApp, PASSWORD};
use dayspick::queue::TaskKind;
use dayspick::repositories::{ProfileRepository, ProjectRepository};

async fn signup(app: &TestApp, username: &str, email: &str) -> axum_test::TestResponse {
    app.server
        .post("/api/auth/signup")
        .json(&json!({
            "username": username,
            "email": email,
            "password": PASSWORD
        }))
        .await
}

/// Code of the most recent confirmation message queued for `email`
async fn sent_code(app: &TestApp, email: &str) -> String {
    app.queued()
        .await
        .into_iter()
        .rev()
        .find_map(|task| match task.kind {
            TaskKind::SendConfirmation {
                email: Some(to),
                code,
                ..
            } if to == email => Some(code),
            _ => None,
        })
        .expect("no confirmation queued")
}

#[tokio::test]
async fn test_signup_queues_confirmation_and_sweep() {
    let app = TestApp::new().await;

    let response = signup(&app, "anna", "anna@example.com").await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["username"], "anna");
    assert_eq!(body["is_confirmed"], false);
    assert!(body.get("password_hash").is_none());

    let tasks = app.queued().await;
    assert_eq!(tasks.len(), 2);
    assert!(matches!(tasks[0].kind, TaskKind::SendConfirmation { .. }));
    match &tasks[1].kind {
        TaskKind::SweepUnconfirmed { profile_id } => {
            assert_eq!(profile_id.to_string(), body["id"].as_str().unwrap());
        }
        other => panic!("unexpected task {:?}", other),
    }
    assert!(tasks[1].run_at - tasks[1].created_at >= time::Duration::minutes(30));
}

#[tokio::test]
async fn test_confirm_then_login() {
    let app = TestApp::new().await;
    signup(&app, "boris", "boris@example.com")
        .await
        .assert_status(StatusCode::OK);

    let login = || {
        app.server
            .post("/api/auth/login")
            .json(&json!({"username": "boris", "password": PASSWORD}))
    };
    login().await.assert_status(StatusCode::FORBIDDEN);

    app.server
        .get("/api/auth/confirm")
        .add_query_param("user", "boris")
        .add_query_param("code", "000000x")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let code = sent_code(&app, "boris@example.com").await;
    let confirmed = app
        .server
        .get("/api/auth/confirm")
        .add_query_param("user", "boris")
        .add_query_param("code", &code)
        .await;
    confirmed.assert_status(StatusCode::OK);

    let response = login().await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["profile"]["email_confirmed"], true);

    let token = body["token"].as_str().unwrap();
    let me: Value = app
        .server
        .get("/api/auth/me")
        .add_header("Authorization", format!("Bearer {}", token))
        .await
        .json();
    assert_eq!(me["username"], "boris");
    assert_eq!(me["email"], "boris@example.com");
}

#[tokio::test]
async fn test_wrong_password() {
    let app = TestApp::new().await;
    let auth = Factory::new(&app.state).create_profile().await;

    app.server
        .post("/api/auth/login")
        .json(&json!({"username": auth.username, "password": "WrongPassword!"}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .post("/api/auth/login")
        .json(&json!({"username": "nobody", "password": PASSWORD}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unconfirmed_username_is_reclaimed() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let stale = factory
        .create_unconfirmed("carol", "old-carol@example.com")
        .await;

    let available: Value = app
        .server
        .get("/api/auth/signup")
        .add_query_param("username", "carol")
        .await
        .json();
    assert_eq!(available["available"], true);

    let response = signup(&app, "carol", "carol@example.com").await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["id"], stale.id.to_string());
    assert_eq!(body["email"], "carol@example.com");
}

#[tokio::test]
async fn test_confirmed_holders_conflict() {
    let app = TestApp::new().await;
    let auth = Factory::new(&app.state).create_profile().await;
    let email = format!("{}@example.com", auth.username);

    signup(&app, &auth.username, "someone-else@example.com")
        .await
        .assert_status(StatusCode::CONFLICT);
    signup(&app, "brand_new", &email)
        .await
        .assert_status(StatusCode::CONFLICT);

    let available: Value = app
        .server
        .get("/api/auth/signup")
        .add_query_param("username", &auth.username)
        .await
        .json();
    assert_eq!(available["available"], false);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::new().await;

    let cases = [
        json!({"username": "dan", "email": "dan@example.com", "password": "short"}),
        json!({"username": "dan", "password": PASSWORD}),
        json!({"username": "d", "email": "dan@example.com", "password": PASSWORD}),
        json!({"email": "dan@example.com", "password": PASSWORD}),
    ];

    for body in cases {
        app.server
            .post("/api/auth/signup")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_sweep_removes_only_unconfirmed() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let stale = factory.create_unconfirmed("eve", "eve@example.com").await;
    let confirmed = factory.create_profile().await;

    let ttl = time::Duration::ZERO;
    assert!(ProfileRepository::delete_if_unconfirmed(&app.state.db, stale.id, ttl)
        .await
        .unwrap());
    assert!(
        !ProfileRepository::delete_if_unconfirmed(&app.state.db, confirmed.profile_id, ttl)
            .await
            .unwrap()
    );

    // Not expired yet
    let fresh = factory.create_unconfirmed("frank", "frank@example.com").await;
    assert!(!ProfileRepository::delete_if_unconfirmed(
        &app.state.db,
        fresh.id,
        time::Duration::minutes(30)
    )
    .await
    .unwrap());
}

#[tokio::test]
async fn test_public_requires_confirmed_phone() {
    let app = TestApp::new().await;
    let auth = Factory::new(&app.state).create_profile().await;

    let body: Value = app
        .server
        .put("/api/users/me")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({"display_name": "Grace", "phone": "+100200300", "is_public": true}))
        .await
        .json();
    assert_eq!(body["display_name"], "Grace");
    assert_eq!(body["is_public"], false);

    let listed: Value = app.server.get("/api/users").await.json();
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn test_delete_me_keeps_shared_projects() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;

    let own = factory
        .create_project(a.profile_id, Some(a.profile_id), &[date!(2024 - 10 - 01)])
        .await;
    let proposal = factory
        .create_project(b.profile_id, Some(a.profile_id), &[date!(2024 - 10 - 02)])
        .await;

    app.server
        .delete("/api/users/me")
        .add_header("Authorization", a.auth_header())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.server
        .get(&format!("/api/users/{}", a.username))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .get("/api/auth/me")
        .add_header("Authorization", a.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get(&format!("/api/projects/{}", proposal.id))
        .add_header("Authorization", b.auth_header())
        .await
        .assert_status(StatusCode::OK);
    // Their own projects went with them
    assert!(ProjectRepository::find(&app.state.db, own.id).await.is_err());

    // The username is free again
    signup(&app, &a.username, "new-owner@example.com")
        .await
        .assert_status(StatusCode::OK);
}

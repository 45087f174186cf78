mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{Factory, TestApp};

#[tokio::test]
async fn test_set_and_get_profile_tags() {
    let app = TestApp::new().await;
    let auth = Factory::new(&app.state).create_profile().await;

    let response = app
        .server
        .put("/api/profile/tags")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({"tags": ["photo", "video", "photo", " "]}))
        .await;
    response.assert_status(StatusCode::OK);

    let tags: Value = response.json();
    let titles: Vec<&str> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["photo", "video"]);
    assert_eq!(tags[1]["rank"], 1);

    let fetched: Value = app
        .server
        .get("/api/profile/tags")
        .add_header("Authorization", auth.auth_header())
        .await
        .json();
    assert_eq!(fetched, tags);
}

#[tokio::test]
async fn test_tags_are_shared_by_title() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;

    let first: Value = app
        .server
        .put("/api/profile/tags")
        .add_header("Authorization", a.auth_header())
        .json(&json!({"tags": ["drone"]}))
        .await
        .json();
    let second: Value = app
        .server
        .put("/api/profile/tags")
        .add_header("Authorization", b.auth_header())
        .json(&json!({"tags": ["wedding", "drone"]}))
        .await
        .json();

    assert_eq!(first[0]["id"], second[1]["id"]);

    let found: Value = app
        .server
        .get("/api/tags")
        .add_query_param("search", "dr")
        .await
        .json();
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["title"], "drone");
}

#[tokio::test]
async fn test_replacing_tags() {
    let app = TestApp::new().await;
    let auth = Factory::new(&app.state).create_profile().await;

    for tags in [json!(["a-tag", "b-tag"]), json!(["b-tag"])] {
        app.server
            .put("/api/profile/tags")
            .add_header("Authorization", auth.auth_header())
            .json(&json!({ "tags": tags }))
            .await
            .assert_status(StatusCode::OK);
    }

    let fetched: Value = app
        .server
        .get("/api/profile/tags")
        .add_header("Authorization", auth.auth_header())
        .await
        .json();
    assert_eq!(fetched.as_array().unwrap().len(), 1);
    assert_eq!(fetched[0]["title"], "b-tag");
    assert_eq!(fetched[0]["rank"], 0);
}

#[tokio::test]
async fn test_profile_tags_require_auth() {
    let app = TestApp::new().await;

    app.server
        .get("/api/profile/tags")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

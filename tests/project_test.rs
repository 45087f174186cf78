mod common;

use axum::http::StatusCode;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::{json, Value};
use time::macros::date;
use uuid::Uuid;

use common::{Factory, TestApp, TestAuth};
use dayspick::entity::day;
use dayspick::queue::TaskKind;
use dayspick::repositories::DayRepository;
use dayspick::services::EventKind;

async fn post_project(app: &TestApp, auth: &TestAuth, body: Value) -> Value {
    let response = app
        .server
        .post("/api/projects")
        .add_header("Authorization", auth.auth_header())
        .json(&body)
        .await;
    response.assert_status(StatusCode::OK);
    response.json()
}

async fn put_project(app: &TestApp, auth: &TestAuth, id: &str, body: Value) -> Value {
    let response = app
        .server
        .put(&format!("/api/projects/{}", id))
        .add_header("Authorization", auth.auth_header())
        .json(&body)
        .await;
    response.assert_status(StatusCode::OK);
    response.json()
}

fn notified(app_tasks: &[dayspick::queue::QueuedTask]) -> Vec<(EventKind, Uuid)> {
    app_tasks
        .iter()
        .filter_map(|task| match &task.kind {
            TaskKind::Notify(event) => Some((event.kind, event.recipient)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_self_owned_project_bounds() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    let body = post_project(
        &app,
        &a,
        json!({
            "title": "Studio",
            "days": {"2024-06-01": null, "2024-06-03": "afternoon"}
        }),
    )
    .await;

    assert_eq!(body["date_start"], "2024-06-01");
    assert_eq!(body["date_end"], "2024-06-03");
    assert_eq!(body["is_wait"], false);
    assert_eq!(body["confirmed"], true);
    assert_eq!(body["user"], a.profile_id.to_string());
    assert_eq!(body["creator"], a.profile_id.to_string());
    assert_eq!(body["days"]["2024-06-03"], "afternoon");

    // Nobody else to tell
    assert!(notified(&app.queued().await).is_empty());
}

#[tokio::test]
async fn test_proposal_then_accept() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;

    let proposal = post_project(
        &app,
        &b,
        json!({
            "title": "Wedding",
            "user": a.profile_id,
            "days": {"2024-07-10": null}
        }),
    )
    .await;
    assert_eq!(proposal["is_wait"], true);
    assert_eq!(proposal["confirmed"], false);

    let id = proposal["id"].as_str().unwrap();
    let accepted = put_project(&app, &a, id, json!({})).await;
    assert_eq!(accepted["is_wait"], false);
    assert_eq!(accepted["confirmed"], true);

    assert_eq!(
        notified(&app.queued().await),
        vec![
            (EventKind::Created, a.profile_id),
            (EventKind::Accepted, b.profile_id)
        ]
    );
}

#[tokio::test]
async fn test_owner_cancels_accepted_proposal() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;

    let proposal = post_project(
        &app,
        &b,
        json!({"title": "Wedding", "user": a.profile_id, "days": {"2024-07-10": null}}),
    )
    .await;
    let id = proposal["id"].as_str().unwrap().to_string();
    put_project(&app, &a, &id, json!({})).await;

    let response = app
        .server
        .delete(&format!("/api/projects/{}", id))
        .add_header("Authorization", a.auth_header())
        .await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["deleted"], false);
    assert_eq!(body["project"]["canceled"], true);
    assert_eq!(body["project"]["canceled_by"], "user");
    assert_eq!(body["project"]["is_wait"], true);
    assert_eq!(body["project"]["confirmed"], true);

    // The row is kept for the creator
    let response = app
        .server
        .get(&format!("/api/projects/{}", id))
        .add_header("Authorization", b.auth_header())
        .await;
    response.assert_status(StatusCode::OK);

    // And its date is gone from both active calendars
    let own: Value = app
        .server
        .get("/api/calendar")
        .add_header("Authorization", a.auth_header())
        .await
        .json();
    assert!(own["days"].as_object().unwrap().is_empty());
    assert!(own["daysOff"].as_array().unwrap().is_empty());

    let offers: Value = app
        .server
        .get("/api/calendar/offers")
        .add_header("Authorization", b.auth_header())
        .await
        .json();
    assert!(offers["days"].get("2024-07-10").is_none());

    let tasks = app.queued().await;
    assert_eq!(
        notified(&tasks).last(),
        Some(&(EventKind::Canceled, b.profile_id))
    );
}

#[tokio::test]
async fn test_owner_declines_pending_proposal() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;

    let proposal = post_project(
        &app,
        &b,
        json!({"title": "Gig", "user": a.profile_id, "days": {"2024-07-11": null}}),
    )
    .await;
    let id = proposal["id"].as_str().unwrap();

    let body: Value = app
        .server
        .delete(&format!("/api/projects/{}", id))
        .add_header("Authorization", a.auth_header())
        .await
        .json();
    assert_eq!(body["deleted"], false);

    assert_eq!(
        notified(&app.queued().await).last(),
        Some(&(EventKind::Declined, b.profile_id))
    );
}

#[tokio::test]
async fn test_folder_bounds_follow_children() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    let folder = post_project(&app, &a, json!({"title": "Series"})).await;
    let folder_id = folder["id"].as_str().unwrap().to_string();

    post_project(
        &app,
        &a,
        json!({
            "title": "Part 1",
            "parent": folder_id,
            "days": {"2024-01-01": null, "2024-01-02": null, "2024-01-03": null}
        }),
    )
    .await;
    let p2 = post_project(
        &app,
        &a,
        json!({
            "title": "Part 2",
            "parent": folder_id,
            "days": {"2024-01-10": null, "2024-01-11": null, "2024-01-12": null}
        }),
    )
    .await;

    let folder_url = format!("/api/projects/{}", folder_id);
    let body: Value = app
        .server
        .get(&folder_url)
        .add_header("Authorization", a.auth_header())
        .await
        .json();
    assert_eq!(body["date_start"], "2024-01-01");
    assert_eq!(body["date_end"], "2024-01-12");

    // A folder with children cannot go
    app.server
        .delete(&folder_url)
        .add_header("Authorization", a.auth_header())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .delete(&format!("/api/projects/{}", p2["id"].as_str().unwrap()))
        .add_header("Authorization", a.auth_header())
        .await
        .assert_status(StatusCode::OK);

    let body: Value = app
        .server
        .get(&folder_url)
        .add_header("Authorization", a.auth_header())
        .await
        .json();
    assert_eq!(body["date_start"], "2024-01-01");
    assert_eq!(body["date_end"], "2024-01-03");
}

#[tokio::test]
async fn test_deleting_last_child_deletes_folder() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    let folder = post_project(&app, &a, json!({"title": "Series"})).await;
    let folder_id = folder["id"].as_str().unwrap().to_string();
    let child = post_project(
        &app,
        &a,
        json!({"title": "Only part", "parent": folder_id, "days": {"2024-02-01": null}}),
    )
    .await;

    app.server
        .delete(&format!("/api/projects/{}", child["id"].as_str().unwrap()))
        .add_header("Authorization", a.auth_header())
        .await
        .assert_status(StatusCode::OK);

    app.server
        .get(&format!("/api/projects/{}", folder_id))
        .add_header("Authorization", a.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_folders_are_one_level_deep() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    let folder = post_project(&app, &a, json!({"title": "Series"})).await;
    let child = post_project(
        &app,
        &a,
        json!({"title": "Part", "parent": folder["id"], "days": {"2024-03-01": null}}),
    )
    .await;

    let response = app
        .server
        .post("/api/projects")
        .add_header("Authorization", a.auth_header())
        .json(&json!({"title": "Nested", "parent": child["id"]}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    let days = json!({"2024-05-01": "setup", "2024-05-02": null});
    let project = post_project(&app, &a, json!({"title": "Fair", "days": days})).await;
    let id = project["id"].as_str().unwrap();
    let project_id: Uuid = id.parse().unwrap();

    let before = DayRepository::for_project(&app.state.db, project_id)
        .await
        .unwrap();
    let again = put_project(&app, &a, id, json!({"days": days})).await;
    let after = DayRepository::for_project(&app.state.db, project_id)
        .await
        .unwrap();

    let ids = |days: &[dayspick::models::Day]| days.iter().map(|d| d.id).collect::<Vec<_>>();
    assert_eq!(ids(&before), ids(&after));
    assert_eq!(again["days"], project["days"]);

    // A missing note keeps the stored one; dropped dates go
    let trimmed = put_project(&app, &a, id, json!({"days": {"2024-05-01": null}})).await;
    assert_eq!(trimmed["days"], json!({"2024-05-01": "setup"}));
    assert_eq!(trimmed["date_end"], "2024-05-01");
}

#[tokio::test]
async fn test_day_dates_are_unique_per_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let project = factory
        .create_project(a.profile_id, Some(a.profile_id), &[date!(2024 - 04 - 01)])
        .await;

    let duplicate = day::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(Some(project.id)),
        date: Set(date!(2024 - 04 - 01)),
        info: Set(None),
    }
    .insert(&app.state.db)
    .await;

    assert!(duplicate.is_err());
}

async fn orphan_count(app: &TestApp) -> u64 {
    day::Entity::find()
        .filter(day::Column::ProjectId.is_null())
        .count(&app.state.db)
        .await
        .unwrap()
}

async fn insert_orphan(app: &TestApp) {
    day::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(None),
        date: Set(date!(2024 - 04 - 05)),
        info: Set(None),
    }
    .insert(&app.state.db)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_day_set_operations_collect_orphans() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;
    let project = post_project(&app, &a, json!({"title": "Fair", "days": {"2024-05-01": null}})).await;
    let id = project["id"].as_str().unwrap();

    insert_orphan(&app).await;
    assert_eq!(orphan_count(&app).await, 1);
    put_project(&app, &a, id, json!({"days": {"2024-05-02": null}})).await;
    assert_eq!(orphan_count(&app).await, 0);

    insert_orphan(&app).await;
    app.server
        .post("/api/daysoff")
        .add_header("Authorization", a.auth_header())
        .json(&json!({"date": "2024-05-09"}))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(orphan_count(&app).await, 0);
}

#[tokio::test]
async fn test_self_owned_delete_is_hard() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let project = factory
        .create_project(a.profile_id, Some(a.profile_id), &[date!(2024 - 04 - 02)])
        .await;

    let body: Value = app
        .server
        .delete(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", a.auth_header())
        .await
        .json();
    assert_eq!(body["deleted"], true);

    app.server
        .get(&format!("/api/projects/{}", project.id))
        .add_header("Authorization", a.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert!(DayRepository::for_project(&app.state.db, project.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_creator_edit_resets_confirmation() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;

    let proposal = post_project(
        &app,
        &b,
        json!({"title": "Wedding", "user": a.profile_id, "days": {"2024-07-10": null}}),
    )
    .await;
    let id = proposal["id"].as_str().unwrap();
    put_project(&app, &a, id, json!({})).await;

    let edited = put_project(&app, &b, id, json!({"info": "Bring lenses", "is_paid": true})).await;
    assert_eq!(edited["is_wait"], true);
    assert_eq!(edited["confirmed"], false);
    assert_eq!(edited["is_paid"], false);
    assert_eq!(edited["info"], "Bring lenses");

    assert_eq!(
        notified(&app.queued().await).last(),
        Some(&(EventKind::Updated, a.profile_id))
    );
}

#[tokio::test]
async fn test_paid_proposal_cannot_be_canceled() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;

    let proposal = post_project(
        &app,
        &b,
        json!({"title": "Wedding", "user": a.profile_id, "days": {"2024-07-10": null}}),
    )
    .await;
    let id = proposal["id"].as_str().unwrap();
    let paid = put_project(&app, &a, id, json!({"is_paid": true})).await;
    assert_eq!(paid["is_paid"], true);

    app.server
        .delete(&format!("/api/projects/{}", id))
        .add_header("Authorization", b.auth_header())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_paid_proposal_is_frozen() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;
    let c = factory.create_profile().await;

    let proposal = post_project(
        &app,
        &b,
        json!({"title": "Wedding", "user": a.profile_id, "days": {"2024-07-10": null}}),
    )
    .await;
    let id = proposal["id"].as_str().unwrap();
    let paid = put_project(&app, &a, id, json!({"is_paid": true})).await;
    assert_eq!(paid["is_wait"], false);
    assert_eq!(paid["confirmed"], true);

    for (actor, body) in [
        (&b, json!({"title": "W2"})),
        (&a, json!({"is_paid": false})),
        (&b, json!({"user": c.profile_id})),
    ] {
        app.server
            .put(&format!("/api/projects/{}", id))
            .add_header("Authorization", actor.auth_header())
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let stored: Value = app
        .server
        .get(&format!("/api/projects/{}", id))
        .add_header("Authorization", a.auth_header())
        .await
        .json();
    assert_eq!(stored["title"], "Wedding");
    assert_eq!(stored["is_paid"], true);
    assert_eq!(stored["is_wait"], false);
    assert_eq!(stored["confirmed"], true);
}

#[tokio::test]
async fn test_reassign_cancels_old_and_creates_new() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;
    let c = factory.create_profile().await;

    let proposal = post_project(
        &app,
        &b,
        json!({"title": "Wedding", "user": a.profile_id, "days": {"2024-07-10": null}}),
    )
    .await;
    let old_id = proposal["id"].as_str().unwrap();

    let moved = put_project(&app, &b, old_id, json!({"user": c.profile_id})).await;
    assert_ne!(moved["id"], proposal["id"]);
    assert_eq!(moved["user"], c.profile_id.to_string());
    assert_eq!(moved["is_wait"], true);
    assert_eq!(moved["days"], json!({"2024-07-10": null}));

    let old: Value = app
        .server
        .get(&format!("/api/projects/{}", old_id))
        .add_header("Authorization", b.auth_header())
        .await
        .json();
    assert_eq!(old["canceled_by"], "creator");

    // Only the creator may move a project
    app.server
        .put(&format!("/api/projects/{}", moved["id"].as_str().unwrap()))
        .add_header("Authorization", c.auth_header())
        .json(&json!({"user": a.profile_id}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_stranger_cannot_touch_project() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let stranger = factory.create_profile().await;
    let project = factory
        .create_project(a.profile_id, Some(a.profile_id), &[date!(2024 - 04 - 03)])
        .await;
    let url = format!("/api/projects/{}", project.id);

    app.server
        .get(&url)
        .add_header("Authorization", stranger.auth_header())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .put(&url)
        .add_header("Authorization", stranger.auth_header())
        .json(&json!({"title": "Mine now"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.server
        .delete(&url)
        .add_header("Authorization", stranger.auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_validation_errors() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    let cases = [
        json!({"title": "Two prices", "money": 100, "money_per_day": 10}),
        json!({"title": "Bad date", "days": {"01.06.2024": null}}),
        json!({"days": {"2024-06-01": null}}),
    ];

    for body in cases {
        app.server
            .post("/api/projects")
            .add_header("Authorization", a.auth_header())
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_per_day_total() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    let body = post_project(
        &app,
        &a,
        json!({
            "title": "Rental",
            "money_per_day": 50,
            "days": {"2024-09-01": null, "2024-09-02": null, "2024-09-03": null}
        }),
    )
    .await;

    assert_eq!(body["money_per_day"], 50);
    assert_eq!(body["total"], 150);
}

#[tokio::test]
async fn test_per_day_total_too_large_is_omitted() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    let body = post_project(
        &app,
        &a,
        json!({
            "title": "Rental",
            "money_per_day": i64::MAX,
            "days": {"2024-09-01": null, "2024-09-02": null}
        }),
    )
    .await;

    assert_eq!(body["money_per_day"], i64::MAX);
    assert!(body["total"].is_null());
}

#[tokio::test]
async fn test_unknown_owner_is_not_found() {
    let app = TestApp::new().await;
    let a = Factory::new(&app.state).create_profile().await;

    app.server
        .post("/api/projects")
        .add_header("Authorization", a.auth_header())
        .json(&json!({"title": "Ghost", "user": Uuid::new_v4()}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_projects_scopes() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let a = factory.create_profile().await;
    let b = factory.create_profile().await;

    factory.create_project(a.profile_id, Some(a.profile_id), &[]).await;
    factory.create_project(b.profile_id, Some(a.profile_id), &[]).await;
    factory.create_project(b.profile_id, Some(b.profile_id), &[]).await;

    let own: Value = app
        .server
        .get("/api/projects")
        .add_header("Authorization", a.auth_header())
        .await
        .json();
    assert_eq!(own["total"], 2);

    // B looking at A only sees what B proposed
    let proposed: Value = app
        .server
        .get("/api/projects")
        .add_query_param("user", a.profile_id)
        .add_header("Authorization", b.auth_header())
        .await
        .json();
    assert_eq!(proposed["total"], 1);
    assert_eq!(proposed["data"][0]["creator"], b.profile_id.to_string());
}

#[tokio::test]
async fn test_create_project_unauthorized() {
    let app = TestApp::new().await;

    app.server
        .post("/api/projects")
        .json(&json!({"title": "Anonymous"}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

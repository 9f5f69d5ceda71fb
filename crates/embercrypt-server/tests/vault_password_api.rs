//! End-to-end tests of the `/api/v1/vaultpassword` resource.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::{StatusCode, header};
use serde_json::json;

use common::TestApp;
use embercrypt_core::service::MAX_ID;

const BASE: &str = "/api/v1/vaultpassword";

fn github() -> serde_json::Value {
    json!({
        "name": "GitHub",
        "username": "octo",
        "password": "hunter2",
        "url": "https://github.com",
        "notes": "work account"
    })
}

#[tokio::test]
async fn list_on_empty_store_is_an_empty_array() {
    let app = TestApp::new();
    let resp = app.get(BASE).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), json!([]));
}

#[tokio::test]
async fn get_unknown_id_is_404_with_empty_body() {
    let app = TestApp::new();
    let resp = app.get(&format!("{BASE}/42")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.is_empty());

    let resp = app.get(&format!("{BASE}/0")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_returns_201_with_location_then_conflicts_on_equivalent() {
    let app = TestApp::new();

    let resp = app.post(BASE, github()).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.header(header::LOCATION), Some("/api/v1/vaultpassword/1"));
    assert!(resp.body.is_empty());

    let mut same = github();
    same["name"] = json!("  github ");
    same["password"] = json!("different");
    let resp = app.post(BASE, same).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert!(resp.body.is_empty());

    let list = app.get(BASE).await.json();
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn created_entry_is_readable_with_server_fields() {
    let app = TestApp::new();
    app.post(BASE, github()).await;

    let resp = app.get(&format!("{BASE}/1")).await;
    assert_eq!(resp.status, StatusCode::OK);
    let entry = resp.json();
    assert_eq!(entry["idPassword"], 1);
    assert_eq!(entry["name"], "GitHub");
    assert_eq!(entry["password"], "hunter2");
    assert!(entry["createdAt"].is_string());
    assert!(entry["updatedAt"].is_string());
}

#[tokio::test]
async fn list_is_in_ascending_id_order() {
    let app = TestApp::new();
    for name in ["c", "a", "b"] {
        let resp = app.post(BASE, json!({ "name": name, "username": "u" })).await;
        assert_eq!(resp.status, StatusCode::CREATED);
    }

    let list = app.get(BASE).await.json();
    let ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["idPassword"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(list[0]["name"], "c");
}

#[tokio::test]
async fn put_by_id_creates_when_absent() {
    let app = TestApp::new();

    let resp = app.put(&format!("{BASE}/7"), github()).await;
    assert_eq!(resp.status, StatusCode::OK);

    let entry = app.get(&format!("{BASE}/7")).await.json();
    assert_eq!(entry["idPassword"], 7);
    assert_eq!(entry["username"], "octo");

    // The next server-assigned id comes after the upserted one.
    let resp = app.post(BASE, json!({ "name": "other" })).await;
    assert_eq!(resp.header(header::LOCATION), Some("/api/v1/vaultpassword/8"));
}

#[tokio::test]
async fn put_by_id_replaces_existing_and_path_id_wins() {
    let app = TestApp::new();
    app.post(BASE, github()).await;

    let resp = app
        .put(&format!("{BASE}/1"), json!({ "idPassword": 99, "name": "Renamed" }))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let entry = app.get(&format!("{BASE}/1")).await.json();
    assert_eq!(entry["name"], "Renamed");
    assert!(entry["username"].is_null());
    assert_eq!(app.get(&format!("{BASE}/99")).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_by_non_positive_id_is_bad_request() {
    let app = TestApp::new();
    let resp = app.put(&format!("{BASE}/0"), github()).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "bad_request");
}

#[tokio::test]
async fn put_beyond_the_id_range_is_bad_request_and_create_keeps_working() {
    let app = TestApp::new();
    let resp = app.put(&format!("{BASE}/{}", i64::MAX), github()).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.post(BASE, json!({ "name": "fresh" })).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.header(header::LOCATION), Some("/api/v1/vaultpassword/1"));
}

#[tokio::test]
async fn create_after_upsert_at_the_largest_id_succeeds() {
    let app = TestApp::new();
    let resp = app.put(&format!("{BASE}/{MAX_ID}"), github()).await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app.post(BASE, json!({ "name": "fresh" })).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.header(header::LOCATION), Some("/api/v1/vaultpassword/1"));

    let resp = app.post(BASE, json!({ "name": "fresh" })).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn update_requires_an_existing_entry() {
    let app = TestApp::new();

    let mut missing = github();
    missing["idPassword"] = json!(5);
    let resp = app.put(BASE, missing).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.is_empty());

    let resp = app.put(BASE, github()).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    assert_eq!(app.get(BASE).await.json(), json!([]));
}

#[tokio::test]
async fn update_stores_every_supplied_field() {
    let app = TestApp::new();
    app.post(BASE, github()).await;

    let replacement = json!({
        "idPassword": 1,
        "name": "GitHub Enterprise",
        "username": "octocat",
        "password": "correct horse",
        "url": "https://ghe.example.com"
    });
    let resp = app.put(BASE, replacement).await;
    assert_eq!(resp.status, StatusCode::OK);

    let entry = app.get(&format!("{BASE}/1")).await.json();
    assert_eq!(entry["name"], "GitHub Enterprise");
    assert_eq!(entry["username"], "octocat");
    assert_eq!(entry["password"], "correct horse");
    assert_eq!(entry["url"], "https://ghe.example.com");
    assert!(entry["notes"].is_null());
}

#[tokio::test]
async fn patch_changes_only_supplied_fields() {
    let app = TestApp::new();
    app.post(BASE, github()).await;
    let before = app.get(&format!("{BASE}/1")).await.json();

    let resp = app
        .patch(&format!("{BASE}/1"), json!({ "password": "rotated" }))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let after = app.get(&format!("{BASE}/1")).await.json();
    assert_eq!(after["password"], "rotated");
    for field in ["idPassword", "name", "username", "url", "notes", "createdAt"] {
        assert_eq!(after[field], before[field], "{field} changed");
    }
}

#[tokio::test]
async fn patch_unknown_id_is_404() {
    let app = TestApp::new();
    let resp = app
        .patch(&format!("{BASE}/3"), json!({ "password": "x" }))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn delete_then_get_is_404() {
    let app = TestApp::new();
    app.post(BASE, github()).await;

    let resp = app.delete(&format!("{BASE}/1")).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert!(resp.body.is_empty());

    assert_eq!(app.get(&format!("{BASE}/1")).await.status, StatusCode::NOT_FOUND);

    let resp = app.delete(&format!("{BASE}/1")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn deleted_ids_are_not_reused() {
    let app = TestApp::new();
    app.post(BASE, github()).await;
    app.delete(&format!("{BASE}/1")).await;

    let resp = app.post(BASE, github()).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.header(header::LOCATION), Some("/api/v1/vaultpassword/2"));
}

#[tokio::test]
async fn malformed_payload_is_rejected_before_the_service() {
    let app = TestApp::new();
    let resp = app.post(BASE, json!({ "idPassword": "not-a-number" })).await;
    assert!(resp.status.is_client_error());
    assert_eq!(app.get(BASE).await.json(), json!([]));
}

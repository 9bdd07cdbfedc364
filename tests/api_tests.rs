//! REST surface round-trips.


use axum_test::TestServer;
use masquerade_server::api;
use masquerade_server::config::Config;
use masquerade_server::room::RoomRegistry;
use serde_json::{json, Value};
use std::sync::Arc;
use test_helpers::quiet_server;

fn test_app() -> (TestServer, Arc<RoomRegistry>) {
    let (registry, _provider) = quiet_server();
    let mut config = Config::default();
    config.ai.api_key = Some("sk-test-secret".into());
    let app = api::create_router(Arc::clone(&registry), Arc::new(config));
    (
        TestServer::new(app).expect("test server should start"),
        registry,
    )
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let (server, _registry) = test_app();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn config_endpoint_redacts_secrets() {
    let (server, _registry) = test_app();
    let response = server.get("/config").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ai"]["api_key"], Value::Null);
    assert!(body["game"]["discussion_secs"].is_number());
}

#[tokio::test]
async fn create_room_round_trip() {
    let (server, _registry) = test_app();
    let response = server
        .post("/api/rooms/create")
        .json(&json!({ "room_name": "Friday Night", "max_humans": 2, "total_players": 6 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["room_name"], "Friday Night");
    assert_eq!(body["max_humans"], 2);
    assert_eq!(body["total_players"], 6);
    assert_eq!(body["room_code"].as_str().unwrap().len(), 6);
}

#[tokio::test]
async fn create_room_rejects_bad_sizes() {
    let (server, _registry) = test_app();
    for payload in [
        json!({ "max_humans": 0 }),
        json!({ "max_humans": 5 }),
        json!({ "max_humans": 2, "total_players": 13 }),
        json!({ "max_humans": 3, "total_players": 2 }),
    ] {
        let response = server.post("/api/rooms/create").json(&payload).await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_ARGUMENT", "payload: {payload}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn info_reports_exists_flag_instead_of_erroring() {
    let (server, _registry) = test_app();

    let response = server.get("/api/rooms/NOSUCH/info").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["exists"], false);

    let created: Value = server
        .post("/api/rooms/create")
        .json(&json!({ "max_humans": 1, "total_players": 4 }))
        .await
        .json();
    let code = created["room_code"].as_str().unwrap();

    let response = server.get(&format!("/api/rooms/{code}/info")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["exists"], true);
    assert_eq!(body["status"], "waiting");
    assert_eq!(body["current_humans"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn join_assigns_player_and_then_refuses_when_running() {
    let (server, _registry) = test_app();
    let created: Value = server
        .post("/api/rooms/create")
        .json(&json!({ "max_humans": 1, "total_players": 4 }))
        .await
        .json();
    let code = created["room_code"].as_str().unwrap();

    let response = server.post(&format!("/api/rooms/{code}/join")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["can_start"], true);
    let player_id = body["player_id"].as_str().unwrap();
    assert!(player_id.starts_with("Player "));

    let response = server.post(&format!("/api/rooms/{code}/join")).await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "ROOM_IN_PROGRESS");
}

#[tokio::test]
async fn join_unknown_room_is_not_found() {
    let (server, _registry) = test_app();
    let response = server.post("/api/rooms/ZZ99AA/join").await;
    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn message_outside_discussion_is_a_phase_violation() {
    let (server, _registry) = test_app();
    let created: Value = server
        .post("/api/rooms/create")
        .json(&json!({ "max_humans": 2, "total_players": 5 }))
        .await
        .json();
    let code = created["room_code"].as_str().unwrap();

    let joined: Value = server.post(&format!("/api/rooms/{code}/join")).await.json();
    let player_id = joined["player_id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/rooms/{code}/message"))
        .json(&json!({ "player_id": player_id, "text": "hello?" }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "PHASE_VIOLATION");
}

#[tokio::test]
async fn creator_leave_terminates_and_room_vanishes() {
    let (server, _registry) = test_app();
    let created: Value = server
        .post("/api/rooms/create")
        .json(&json!({ "max_humans": 2, "total_players": 5 }))
        .await
        .json();
    let code = created["room_code"].as_str().unwrap();

    let joined: Value = server.post(&format!("/api/rooms/{code}/join")).await.json();
    let player_id = joined["player_id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/rooms/{code}/leave"))
        .json(&json!({ "player_id": player_id }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["action"], "terminated");

    let info: Value = server.get(&format!("/api/rooms/{code}/info")).await.json();
    assert_eq!(info["exists"], false);

    let response = server.post(&format!("/api/rooms/{code}/join")).await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn state_snapshot_serves_polling_clients() {
    let (server, _registry) = test_app();
    let created: Value = server
        .post("/api/rooms/create")
        .json(&json!({ "max_humans": 2, "total_players": 6 }))
        .await
        .json();
    let code = created["room_code"].as_str().unwrap();
    server.post(&format!("/api/rooms/{code}/join")).await;

    let response = server.get(&format!("/api/rooms/{code}/state")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["phase"], "lobby");
    assert_eq!(body["status"], "waiting");
    assert_eq!(body["players"].as_array().unwrap().len(), 5);
    assert_eq!(body["round"], 0);
    assert!(body["winner"].is_null());
    // Roles are never exposed in snapshots.
    for player in body["players"].as_array().unwrap() {
        assert!(player.get("role").is_none());
    }
}

#[tokio::test]
async fn listing_defaults_and_fields() {
    let (server, _registry) = test_app();
    server
        .post("/api/rooms/create")
        .json(&json!({ "max_humans": 2, "total_players": 5, "room_name": "Open Table" }))
        .await;

    let response = server.get("/api/rooms/list").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_pages"], 1);
    let rooms = body["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["room_name"], "Open Table");
    assert_eq!(rooms[0]["status"], "waiting");
    assert_eq!(rooms[0]["current_humans"], 0);
    assert_eq!(rooms[0]["max_humans"], 2);
    assert_eq!(rooms[0]["total_players"], 5);
}

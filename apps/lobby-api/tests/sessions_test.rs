mod common;

use std::collections::HashSet;

use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use axum::http::StatusCode;
use serde_json::{json, Value};

fn characters(body: &Value) -> Vec<Option<String>> {
    body["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["character"].as_str().map(str::to_string))
        .collect()
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_session_returns_code_state_and_gm_token() {
    let app = common::test_app();

    let resp = app
        .server
        .post("/api/v1/sessions")
        .json(&json!({ "seats": 4, "gm": { "id": "gm-1", "name": "Ambrose" }, "ai_seats": [3] }))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: Value = resp.json();
    assert!(body["session"]["id"].as_str().unwrap().starts_with("ASH-"));
    assert!(body["gm_token"].as_str().unwrap().starts_with("gmt_"));
    assert_eq!(body["session"]["status"], "lobby");
    assert!(body["session"]["selection_ends_at"].is_null());
    assert_eq!(body["session"]["players"].as_array().unwrap().len(), 4);
    assert_eq!(body["session"]["players"][3]["type"], "ai");
    assert_eq!(body["session"]["gm"]["role"], "gm");
    assert_eq!(body["session"]["gm"]["name"], "Ambrose");
    assert_eq!(
        body["session"]["available_characters"].as_array().unwrap().len(),
        6
    );
}

#[tokio::test]
async fn create_session_rejects_zero_seats() {
    let app = common::test_app();

    let resp = app
        .server
        .post("/api/v1/sessions")
        .json(&json!({ "seats": 0 }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn gm_token_never_appears_in_polled_state() {
    let app = common::test_app();
    let (code, token) = common::create_session(&app.server, json!({})).await;

    let body = common::state(&app.server, &code).await;
    assert!(!body.to_string().contains(&token));
    assert!(body.get("gm_token").is_none());
}

// ---------------------------------------------------------------------------
// GET /api/v1/sessions/:code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_session_is_404() {
    let app = common::test_app();

    let resp = app.server.get("/api/v1/sessions/ASH-ZZZZ").await;
    resp.assert_status(StatusCode::NOT_FOUND);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions/:code/join
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_binds_identity_and_allows_rejoin() {
    let app = common::test_app();
    let (code, _) = common::create_session(&app.server, json!({ "seats": 2 })).await;

    let body = common::join(&app.server, &code, 0, "alice").await;
    assert_eq!(body["players"][0]["id"], "alice");
    assert_eq!(body["players"][0]["connected"], true);

    // Same identity again is fine.
    common::join(&app.server, &code, 0, "alice").await;

    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/join"))
        .json(&json!({ "seat": 0, "user_id": "mallory" }))
        .await;
    resp.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn join_rejects_ai_seat_and_missing_seat() {
    let app = common::test_app();
    let (code, _) =
        common::create_session(&app.server, json!({ "seats": 2, "ai_seats": [1] })).await;

    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/join"))
        .json(&json!({ "seat": 1, "user_id": "bob" }))
        .await;
    resp.assert_status(StatusCode::CONFLICT);

    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/join"))
        .json(&json!({ "seat": 7, "user_id": "bob" }))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn join_without_seat_field_is_400() {
    let app = common::test_app();
    let (code, _) = common::create_session(&app.server, json!({})).await;

    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/join"))
        .json(&json!({ "user_id": "bob" }))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions/:code/ready
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ready_toggles_for_joined_seat() {
    let app = common::test_app();
    let (code, _) = common::create_session(&app.server, json!({ "seats": 2 })).await;

    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/ready"))
        .json(&json!({ "seat": 0, "ready": true }))
        .await;
    resp.assert_status(StatusCode::CONFLICT);

    common::join(&app.server, &code, 0, "alice").await;
    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/ready"))
        .json(&json!({ "seat": 0, "ready": true }))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["players"][0]["ready"], true);
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn begin_selection_is_idempotent() {
    let app = common::test_app();
    let (code, _) = common::create_session(&app.server, json!({ "seats": 2 })).await;

    let first: Value = app
        .server
        .post(&format!("/api/v1/sessions/{code}/selection"))
        .await
        .json();
    app.advance_ms(10);
    let second: Value = app
        .server
        .post(&format!("/api/v1/sessions/{code}/selection"))
        .await
        .json();

    assert_eq!(first["status"], "selection_open");
    assert!(first["selection_ends_at"].is_string());
    assert_eq!(first["selection_ends_at"], second["selection_ends_at"]);
    assert_eq!(app.clock.pending(), 1);
}

#[tokio::test]
async fn countdown_expiry_auto_assigns_last_seat_and_starts() {
    let app = common::test_app();
    let (code, _) =
        common::create_session(&app.server, json!({ "seats": 4, "gm": { "id": "gm-1" } })).await;

    for (seat, character) in ["ravenkeeper", "occult_scholar", "moonlit_detective"]
        .iter()
        .enumerate()
    {
        common::join(&app.server, &code, seat, &format!("player-{seat}")).await;
        common::select(&app.server, &code, seat, character).await;
    }

    let before = common::state(&app.server, &code).await;
    assert_eq!(before["status"], "selection_open");
    let remaining: Vec<String> = before["available_characters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap().to_string())
        .collect();
    assert_eq!(remaining.len(), 3);

    app.advance_ms(common::SELECTION_WINDOW_MS);

    let after = common::state(&app.server, &code).await;
    assert_eq!(after["status"], "starting");
    let assigned = after["players"][3]["character"].as_str().unwrap().to_string();
    assert!(remaining.contains(&assigned));

    app.advance_ms(common::START_DELAY_MS);
    assert_eq!(common::state(&app.server, &code).await["status"], "in_progress");
}

#[tokio::test]
async fn second_claim_for_same_character_gets_409() {
    let app = common::test_app();
    let (code, _) = common::create_session(&app.server, json!({ "seats": 3 })).await;

    common::select(&app.server, &code, 0, "ravenkeeper").await;
    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/select"))
        .json(&json!({ "seat": 1, "character": "ravenkeeper" }))
        .await;
    resp.assert_status(StatusCode::CONFLICT);

    let body = common::state(&app.server, &code).await;
    assert_eq!(body["players"][0]["character"], "ravenkeeper");
    assert!(body["players"][1]["character"].is_null());
}

#[tokio::test]
async fn final_claim_moves_straight_to_starting() {
    let app = common::test_app();
    let (code, _) = common::create_session(&app.server, json!({ "seats": 2 })).await;

    common::select(&app.server, &code, 0, "ravenkeeper").await;
    let body = common::select(&app.server, &code, 1, "occult_scholar").await;
    assert_eq!(body["status"], "starting");

    // Countdown expiry afterwards changes nothing.
    app.advance_ms(common::SELECTION_WINDOW_MS);
    let body = common::state(&app.server, &code).await;
    assert_eq!(body["status"], "starting");
    assert_eq!(body["players"][0]["character"], "ravenkeeper");

    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/select"))
        .json(&json!({ "seat": 0, "character": "moonlit_detective" }))
        .await;
    resp.assert_status(StatusCode::CONFLICT);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn unknown_character_is_404() {
    let app = common::test_app();
    let (code, _) = common::create_session(&app.server, json!({ "seats": 2 })).await;

    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/select"))
        .json(&json!({ "seat": 0, "character": "the_butler" }))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ai_seats_are_covered_when_countdown_expires() {
    let app = common::test_app();
    let (code, _) =
        common::create_session(&app.server, json!({ "seats": 3, "ai_seats": [1, 2] })).await;

    common::select(&app.server, &code, 0, "ravenkeeper").await;
    // Countdown plus one pending pick per AI seat.
    assert_eq!(app.clock.pending(), 3);

    app.advance_ms(common::SELECTION_WINDOW_MS - 1);
    let body = common::state(&app.server, &code).await;
    assert_eq!(body["status"], "selection_open");
    assert!(body["players"][1]["character"].is_null());

    app.advance_ms(1);
    let body = common::state(&app.server, &code).await;
    assert_eq!(body["status"], "starting");
    let claimed: HashSet<_> = characters(&body).into_iter().flatten().collect();
    assert_eq!(claimed.len(), 3);
    // Only the start delay is left.
    assert_eq!(app.clock.pending(), 1);
}

// ---------------------------------------------------------------------------
// POST /api/v1/sessions/:code/disconnect
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disconnect_hands_seat_to_ai_and_drops_claim() {
    let app = common::test_app();
    let (code, _) = common::create_session(&app.server, json!({ "seats": 3 })).await;

    common::join(&app.server, &code, 0, "alice").await;
    common::join(&app.server, &code, 1, "bob").await;
    common::select(&app.server, &code, 1, "ravenkeeper").await;

    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/disconnect"))
        .json(&json!({ "seat": 1 }))
        .await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["players"][1]["type"], "ai");
    assert_eq!(body["players"][1]["connected"], false);
    assert!(body["players"][1]["character"].is_null());

    // bob cannot reclaim the seat.
    let resp = app
        .server
        .post(&format!("/api/v1/sessions/{code}/join"))
        .json(&json!({ "seat": 1, "user_id": "bob" }))
        .await;
    resp.assert_status(StatusCode::CONFLICT);

    app.advance_ms(common::SELECTION_WINDOW_MS);
    let body = common::state(&app.server, &code).await;
    assert_eq!(body["status"], "starting");
    assert_eq!(body["players"][1]["type"], "ai");
    let claimed: HashSet<_> = characters(&body).into_iter().flatten().collect();
    assert_eq!(claimed.len(), 3);
}

#[tokio::test]
async fn health_counts_live_sessions() {
    let app = common::test_app();
    common::create_session(&app.server, json!({})).await;

    let resp = app.server.get("/health").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 1);
}

#[tokio::test]
async fn session_creation_is_rate_limited_per_client() {
    let app = common::test_app();

    let mut last_code = String::new();
    for _ in 0..common::RATE_LIMIT_MAX {
        last_code = common::create_session(&app.server, json!({ "seats": 1 })).await.0;
    }

    let resp = app
        .server
        .post("/api/v1/sessions")
        .json(&json!({ "seats": 1 }))
        .await;
    resp.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        app.state.lobby.session_count(),
        common::RATE_LIMIT_MAX as usize
    );

    // Polling is never throttled.
    common::state(&app.server, &last_code).await;
}

#[tokio::test]
async fn cors_only_echoes_allowed_origins() {
    let app = common::test_app();

    let resp = app
        .server
        .get("/health")
        .add_header(ORIGIN, common::ALLOWED_ORIGIN)
        .await;
    resp.assert_status_ok();
    assert_eq!(
        resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
        common::ALLOWED_ORIGIN
    );

    let resp = app
        .server
        .get("/health")
        .add_header(ORIGIN, "https://evil.example")
        .await;
    assert!(resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

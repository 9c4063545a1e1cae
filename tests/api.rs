//! Route-level tests driven through the full middleware stack.

use axum::http::{header, StatusCode};
use serde_json::json;
use users_api::http::X_REQUEST_ID;

mod common;
use common::{admin_token, authed, get, send, test_app, test_config, with_json};

fn ada(id: i32) -> serde_json::Value {
    json!({ "id": id, "firstName": "Ada", "lastName": "Lovelace", "age": 36, "isCustomer": true })
}

#[tokio::test]
async fn test_root_greeting() {
    let (app, _) = test_app(&test_config());
    let (status, _, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Minimal Users API" }));
}

#[tokio::test]
async fn test_list_filters_seed_data() {
    let (app, _) = test_app(&test_config());
    let (status, _, body) = send(&app, get("/users?isCustomer=true&search=jo")).await;
    assert_eq!(status, StatusCode::OK);

    let mut names: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| format!("{} {}", u["firstName"].as_str().unwrap(), u["lastName"].as_str().unwrap()))
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alex Johnson", "John Doe"]);
}

#[tokio::test]
async fn test_get_by_id() {
    let (app, _) = test_app(&test_config());

    let (status, _, body) = send(&app, get("/users/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lastName"], "Smith");

    let (status, _, body) = send(&app, get("/users/0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!("Id must be > 0."));

    let (status, _, body) = send(&app, get("/users/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!("User with Id 99 not found."));
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _) = test_app(&test_config());

    let (status, response, _) = send(&app, with_json("POST", "/users", None, ada(10))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let (status, _, _) = send(&app, with_json("PUT", "/users/1", None, ada(1))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, authed("DELETE", "/users/1", "not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // nothing was deleted
    let (status, _, _) = send(&app, get("/users/1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_any_role_is_authorized() {
    let (app, state) = test_app(&test_config());
    let token = state.tokens.issue("guest", "viewer").unwrap();
    let (status, _, _) = send(&app, authed("GET", "/metrics", &token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_then_get() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    let (status, response, body) =
        send(&app, with_json("POST", "/users", Some(&token), ada(10))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.headers()[header::LOCATION], "/users/10");
    assert_eq!(body, ada(10));

    let (status, _, body) = send(&app, get("/users/10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ada(10));
}

#[tokio::test]
async fn test_create_duplicate_conflicts() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    let (status, _, body) = send(&app, with_json("POST", "/users", Some(&token), ada(1))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!("User with Id 1 already exists."));

    let (_, _, body) = send(&app, get("/users/1")).await;
    assert_eq!(body["firstName"], "John");
}

#[tokio::test]
async fn test_create_validation_priority() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    let payload = json!({ "id": 0, "firstName": "", "lastName": "", "age": 0, "isCustomer": false });
    let (status, _, body) = send(&app, with_json("POST", "/users", Some(&token), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!("Id must be > 0!"));

    let payload = json!({ "id": 5, "firstName": "Al", "lastName": " ", "age": 3 });
    let (_, _, body) = send(&app, with_json("POST", "/users", Some(&token), payload)).await;
    assert_eq!(body, json!("LastName is required!"));

    let (status, _, body) =
        send(&app, with_json("POST", "/users", Some(&token), json!(null))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!("User payload is missing!"));
}

#[tokio::test]
async fn test_update_flow() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    // a valid body id is replaced by the path id
    let changed = json!({ "id": 77, "firstName": "Johnny", "lastName": "Doe", "age": 31, "isCustomer": false });
    let (status, _, body) = send(&app, with_json("PUT", "/users/1", Some(&token), changed)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["firstName"], "Johnny");

    let (_, _, body) = send(&app, get("/users/1")).await;
    assert_eq!(body["age"], 31);
    assert_eq!(state.store.get(77), None);

    let (status, _, _) = send(&app, with_json("PUT", "/users/404", Some(&token), ada(404))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, with_json("PUT", "/users/-1", Some(&token), ada(1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let invalid = json!({ "id": 1, "firstName": "X", "lastName": "Y", "age": 0 });
    let (status, _, body) = send(&app, with_json("PUT", "/users/1", Some(&token), invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!("Age must be > 0!"));
}

#[tokio::test]
async fn test_update_validates_body_id_as_sent() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    let zero_id = json!({ "id": 0, "firstName": "X", "lastName": "Y", "age": 5 });
    let (status, _, body) = send(&app, with_json("PUT", "/users/1", Some(&token), zero_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!("Id must be > 0!"));

    let no_id = json!({ "firstName": "X", "lastName": "Y", "age": 5 });
    let (status, _, body) = send(&app, with_json("PUT", "/users/1", Some(&token), no_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!("Id must be > 0!"));

    // the stored record is untouched
    let (_, _, body) = send(&app, get("/users/1")).await;
    assert_eq!(body["firstName"], "John");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_never_interleave() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    let mut tasks = tokio::task::JoinSet::new();
    for age in 1..=10 {
        let app = app.clone();
        let token = token.clone();
        tasks.spawn(async move {
            let user = json!({ "id": 1, "firstName": "Racer", "lastName": "Doe", "age": age });
            let (status, _, body) = send(&app, with_json("PUT", "/users/1", Some(&token), user)).await;
            (age, status, body)
        });
    }

    let mut winners = Vec::new();
    while let Some(outcome) = tasks.join_next().await {
        let (age, status, body) = outcome.unwrap();
        match status {
            StatusCode::OK => winners.push(age),
            StatusCode::CONFLICT => assert_eq!(
                body,
                json!("User with Id 1 could not be updated due to a concurrent modification.")
            ),
            other => panic!("unexpected status {other}"),
        }
    }
    assert!(!winners.is_empty());

    let stored = state.store.get(1).unwrap();
    assert_eq!(stored.first_name, "Racer");
    assert!(winners.contains(&stored.age));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (app, state) = test_app(&test_config());
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    // issued 25h ago with a 24h lifetime
    let token = state.tokens.issue_at("Nikolai", "admin", now - 25 * 3600).unwrap();

    let (status, response, body) = send(&app, authed("DELETE", "/users/1", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(body, json!("Unauthorized"));

    let (status, _, _) = send(&app, get("/users/1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unparseable_id_is_not_found() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    for uri in ["/users/abc", "/users/99999999999", "/users/1.5"] {
        let (status, _, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!("Not found."), "{uri}");
    }

    let (status, _, body) = send(&app, authed("DELETE", "/users/abc", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!("Not found."));

    let (status, _, body) = send(&app, get("/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!("Not found."));
}

#[tokio::test]
async fn test_delete_twice() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    let (status, _, body) = send(&app, authed("DELETE", "/users/3", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("User with Id 3 deleted."));

    let (status, _, _) = send(&app, authed("DELETE", "/users/3", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_boom_is_translated_with_trace_id() {
    let (app, _) = test_app(&test_config());
    let (status, response, body) = send(&app, get("/boom")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error.");
    let trace_id = body["traceId"].as_str().unwrap();
    assert!(!trace_id.is_empty());
    assert_eq!(response.headers()[X_REQUEST_ID], trace_id);

    // no internal detail leaks to the client
    assert!(!body.to_string().contains("Test exception"));

    // the app keeps serving after a fault
    let (status, _, _) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_error_route() {
    let (app, _) = test_app(&test_config());
    let (status, _, body) = send(&app, get("/error")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error.");
    assert!(body["traceId"].is_string());
}

#[tokio::test]
async fn test_metrics_count_by_route() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    send(&app, get("/")).await;
    send(&app, get("/users/1")).await;
    send(&app, get("/users/2")).await;
    send(&app, get("/nowhere")).await;
    send(&app, get("/boom")).await;
    // rejected requests are counted too
    send(&app, get("/metrics")).await;

    let (status, _, body) = send(&app, authed("GET", "/metrics", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["GET /"], 1);
    assert_eq!(body["GET /users/{id}"], 2);
    assert_eq!(body["Unknown"], 1);
    assert_eq!(body["GET /boom"], 1);
    assert_eq!(body["GET /metrics"], 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_single_winner() {
    let (app, state) = test_app(&test_config());
    let token = admin_token(&state);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let app = app.clone();
        let token = token.clone();
        tasks.spawn(async move {
            send(&app, with_json("POST", "/users", Some(&token), ada(50))).await.0
        });
    }

    let mut created = 0;
    let mut conflicts = 0;
    while let Some(status) = tasks.join_next().await {
        match status.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!((created, conflicts), (1, 9));
}

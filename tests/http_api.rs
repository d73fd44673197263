use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use colabri_share::{
    build_app,
    clock::ManualClock,
    db::MemoryStorage,
    services::{
        identity::{MemoryIdentity, UserProfile},
        SyncService, SyncSettings,
    },
    state::AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

struct TestApp {
    app: Router,
    clock: Arc<ManualClock>,
}

async fn test_app() -> TestApp {
    test_app_with_secret(Some(SECRET)).await
}

async fn test_app_with_secret(secret: Option<&str>) -> TestApp {
    let identity = Arc::new(MemoryIdentity::new());
    for (id, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
        identity
            .register(
                id,
                UserProfile {
                    name: Some(name.to_string()),
                    email: Some(format!("{}@example.com", id)),
                },
            )
            .await;
    }
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let sync = SyncService::new(
        Arc::new(MemoryStorage::new()),
        identity,
        clock.clone(),
        SyncSettings::default(),
    );
    let app = build_app(AppState {
        sync,
        jwt_secret: secret.map(str::to_string),
        service_name: "colabri-share".to_string(),
    });
    TestApp { app, clock }
}

fn token_for(user: &str) -> String {
    let claims = json!({
        "sub": user,
        "type": "user",
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn call(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create(app: &Router, user: &str, title: &str) -> String {
    let (status, body) = call(app, Method::POST, "/api/v1/documents", Some(user), Some(json!({"title": title}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_and_fetch_document() {
    let t = test_app().await;
    let id = create(&t.app, "alice", "X").await;

    let (status, doc) = call(&t.app, Method::GET, &format!("/api/v1/documents/{}", id), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["title"], "X");
    assert_eq!(doc["content"], "");
    assert_eq!(doc["isPublic"], false);
    assert_eq!(doc["ownerId"], "alice");
}

#[tokio::test]
async fn anonymous_list_is_empty_and_create_is_rejected() {
    let t = test_app().await;
    create(&t.app, "alice", "Mine").await;

    let (status, docs) = call(&t.app, Method::GET, "/api/v1/documents", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(docs, json!([]));

    let (status, body) = call(&t.app, Method::POST, "/api/v1/documents", None, Some(json!({"title": "Nope"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn private_document_is_invisible_to_others() {
    let t = test_app().await;
    let id = create(&t.app, "alice", "Secret").await;

    let (status, body) = call(&t.app, Method::GET, &format!("/api/v1/documents/{}", id), Some("bob"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");

    let (status, _) = call(
        &t.app,
        Method::PUT,
        &format!("/api/v1/documents/{}/content", id),
        Some("bob"),
        Some(json!({"content": "hijack"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn sharing_flow() {
    let t = test_app().await;
    let id = create(&t.app, "alice", "Plan").await;
    let doc_uri = format!("/api/v1/documents/{}", id);

    let (status, _) = call(
        &t.app,
        Method::POST,
        &format!("{}/collaborators", doc_uri),
        Some("alice"),
        Some(json!({"collaboratorEmail": "bob@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(
        &t.app,
        Method::POST,
        &format!("{}/collaborators", doc_uri),
        Some("alice"),
        Some(json!({"collaboratorEmail": "nobody@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "USER_NOT_FOUND");

    let (status, _) = call(
        &t.app,
        Method::PUT,
        &format!("{}/content", doc_uri),
        Some("bob"),
        Some(json!({"content": "bob was here"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &t.app,
        Method::PUT,
        &format!("{}/title", doc_uri),
        Some("bob"),
        Some(json!({"title": "Bob's plan"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&t.app, Method::PUT, &format!("{}/public", doc_uri), Some("alice"), Some(json!({"isPublic": true}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, doc) = call(&t.app, Method::GET, &doc_uri, Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["content"], "bob was here");
    assert_eq!(doc["collaborators"], json!(["bob"]));

    let (status, _) = call(&t.app, Method::PUT, &format!("{}/content", doc_uri), Some("carol"), Some(json!({"content": "x"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn list_orders_owned_before_shared() {
    let t = test_app().await;
    let b = create(&t.app, "alice", "B").await;
    t.clock.advance(chrono::Duration::seconds(1));
    let c = create(&t.app, "bob", "C").await;
    call(
        &t.app,
        Method::POST,
        &format!("/api/v1/documents/{}/collaborators", c),
        Some("bob"),
        Some(json!({"collaboratorEmail": "alice@example.com"})),
    )
    .await;
    t.clock.advance(chrono::Duration::seconds(1));
    let a = create(&t.app, "alice", "A").await;

    let (_, docs) = call(&t.app, Method::GET, "/api/v1/documents", Some("alice"), None).await;
    let ids: Vec<&str> = docs.as_array().unwrap().iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![a.as_str(), b.as_str(), c.as_str()]);
}

#[tokio::test]
async fn presence_round_trip() {
    let t = test_app().await;
    let id = create(&t.app, "alice", "Live").await;
    let doc_uri = format!("/api/v1/documents/{}", id);
    call(
        &t.app,
        Method::POST,
        &format!("{}/collaborators", doc_uri),
        Some("alice"),
        Some(json!({"collaboratorEmail": "bob@example.com"})),
    )
    .await;

    let heartbeat = json!({"cursorPosition": 4, "selection": {"start": 2, "end": 4}});
    let (status, _) = call(&t.app, Method::PUT, &format!("{}/session", doc_uri), Some("bob"), Some(heartbeat)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(
        &t.app,
        Method::PUT,
        &format!("{}/session", doc_uri),
        Some("alice"),
        Some(json!({"cursorPosition": 0, "selection": {"start": 0, "end": 0}})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, sessions) = call(&t.app, Method::GET, &format!("{}/sessions", doc_uri), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["userId"], "bob");
    assert_eq!(sessions[0]["userName"], "Bob");
    assert_eq!(sessions[0]["selection"], json!({"start": 2, "end": 4}));

    let (status, _) = call(&t.app, Method::DELETE, &format!("{}/session", doc_uri), Some("bob"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, sessions) = call(&t.app, Method::GET, &format!("{}/sessions", doc_uri), Some("alice"), None).await;
    assert_eq!(sessions, json!([]));
}

#[tokio::test]
async fn malformed_selection_is_rejected() {
    let t = test_app().await;
    let id = create(&t.app, "alice", "Live").await;
    let (status, body) = call(
        &t.app,
        Method::PUT,
        &format!("/api/v1/documents/{}/session", id),
        Some("alice"),
        Some(json!({"cursorPosition": 1, "selection": {"start": 5, "end": 1}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn undecodable_heartbeat_body_is_invalid_argument() {
    let t = test_app().await;
    let id = create(&t.app, "alice", "Live").await;
    let uri = format!("/api/v1/documents/{}/session", id);

    for body in [
        json!({"cursorPosition": -1, "selection": {"start": 0, "end": 0}}),
        json!({"cursorPosition": 1}),
    ] {
        let (status, body) = call(&t.app, Method::PUT, &uri, Some("alice"), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "INVALID_ARGUMENT");
    }

    let request = Request::builder()
        .method(Method::PUT)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for("alice")))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn tokens_are_ignored_without_a_secret() {
    let t = test_app_with_secret(None).await;
    let uri = format!("/api/v1/documents/{}", uuid::Uuid::new_v4());

    let (status, _) = call(&t.app, Method::DELETE, &format!("{}/session", uri), Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, sessions) = call(&t.app, Method::GET, &format!("{}/sessions", uri), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions, json!([]));
    let (status, body) = call(&t.app, Method::POST, "/api/v1/documents", Some("alice"), Some(json!({"title": "X"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn leave_never_fails() {
    let t = test_app().await;
    let (status, _) = call(&t.app, Method::DELETE, "/api/v1/documents/not-a-uuid/session", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let uri = format!("/api/v1/documents/{}/session", uuid::Uuid::new_v4());
    let (status, _) = call(&t.app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn delete_clears_sessions() {
    let t = test_app().await;
    let id = create(&t.app, "alice", "Temp").await;
    let doc_uri = format!("/api/v1/documents/{}", id);
    call(&t.app, Method::PUT, &format!("{}/public", doc_uri), Some("alice"), Some(json!({"isPublic": true}))).await;
    call(
        &t.app,
        Method::PUT,
        &format!("{}/session", doc_uri),
        Some("carol"),
        Some(json!({"cursorPosition": 0, "selection": {"start": 0, "end": 0}})),
    )
    .await;

    let (status, _) = call(&t.app, Method::DELETE, &doc_uri, Some("carol"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&t.app, Method::DELETE, &doc_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&t.app, Method::GET, &doc_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, sessions) = call(&t.app, Method::GET, &format!("{}/sessions", doc_uri), Some("alice"), None).await;
    assert_eq!(sessions, json!([]));
}

#[tokio::test]
async fn invalid_document_id_on_mutation() {
    let t = test_app().await;
    let (status, body) = call(
        &t.app,
        Method::PUT,
        "/api/v1/documents/not-a-uuid/content",
        Some("alice"),
        Some(json!({"content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn health_and_sync_policy() {
    let t = test_app().await;
    let (status, health) = call(&t.app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["storage"], "memory");

    let (status, policy) = call(&t.app, Method::GET, "/api/v1/sync-policy", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(policy["contentDebounceMs"], 1000);
    assert_eq!(policy["heartbeatIntervalMs"], 500);
    assert_eq!(policy["stalenessWindowSecs"], 300);
}

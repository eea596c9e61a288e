// tests/common/mod.rs - in-process mock of the Visual Insight REST backend
#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use visual_insight_client::{ApiClient, AuthSession, ClientConfig, UserProfile};

#[derive(Default)]
pub struct Backend {
    pub videos: Vec<Value>,
    pub conversations: Vec<Value>,
    pub events: HashMap<Uuid, Vec<Value>>,
    pub messages: HashMap<Uuid, Vec<Value>>,
    pub status_overrides: HashMap<Uuid, String>,
    /// Serve bare arrays instead of `{"results": [...]}` envelopes.
    pub plain_lists: bool,
    /// Answer video listings with a 200 whose body is not JSON.
    pub garbled_lists: bool,
    pub fail_uploads: bool,
    pub fail_sends: bool,
    pub fail_analyze: bool,
    pub fail_delete: bool,
    pub last_events_query: Option<HashMap<String, String>>,
}

pub type SharedBackend = Arc<Mutex<Backend>>;

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();
}

pub fn video_json(id: Uuid, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "status": status,
        "events_count": 0,
        "violations_count": 0
    })
}

pub fn event_json(title: &str, severity: &str, start_time: f64) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "event_type": "detection",
        "title": title,
        "description": "",
        "severity": severity,
        "start_time": start_time,
        "confidence": 0.9,
        "is_violation": severity == "violation" || severity == "critical"
    })
}

pub fn message_json(content: &str, sender: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "content": content,
        "sender": sender,
        "created_at": "2026-08-01T10:00:00Z"
    })
}

pub fn conversation_json(id: Uuid, video: Option<Uuid>) -> Value {
    json!({ "id": id, "video": video, "title": null })
}

pub async fn authed_client(base_url: &str) -> ApiClient {
    let session = AuthSession::new();
    session
        .authenticate(
            UserProfile {
                id: Uuid::new_v4(),
                email: "analyst@example.com".to_string(),
                full_name: None,
            },
            "test-token".to_string(),
        )
        .await;
    let config = ClientConfig {
        api_base_url: base_url.to_string(),
        ..ClientConfig::default()
    };
    ApiClient::from_config(&config, session)
}

/// Bind the mock backend to an ephemeral port and return its API base URL.
pub async fn spawn_backend(backend: SharedBackend) -> String {
    let app = Router::new()
        .route("/api/videos/", get(list_videos))
        .route("/api/videos/upload/", post(upload_video))
        .route("/api/videos/:id/", get(get_video).delete(delete_video))
        .route("/api/videos/:id/analyze/", post(analyze_video))
        .route("/api/videos/:id/status/", get(video_status))
        .route("/api/videos/:id/events/", get(video_events))
        .route(
            "/api/chat/conversations/",
            get(list_conversations).post(create_conversation),
        )
        .route("/api/chat/conversations/:id/messages/", get(list_messages))
        .route("/api/chat/send-message/", post(send_message))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("Token "))
        .unwrap_or(false)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
}

fn wrap_list(plain: bool, items: Vec<Value>) -> Value {
    if plain {
        Value::Array(items)
    } else {
        json!({ "results": items })
    }
}

async fn list_videos(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    if !authorized(&headers) {
        return unauthorized().into_response();
    }
    let backend = backend.lock().unwrap();
    if backend.garbled_lists {
        return (StatusCode::OK, "this is not json at all").into_response();
    }
    (
        StatusCode::OK,
        Json(wrap_list(backend.plain_lists, backend.videos.clone())),
    )
        .into_response()
}

async fn get_video(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let backend = backend.lock().unwrap();
    match backend.videos.iter().find(|v| v["id"] == json!(id)) {
        Some(video) => (StatusCode::OK, Json(video.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))),
    }
}

async fn upload_video(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut title = String::new();
    let mut file_bytes = 0usize;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name().unwrap_or("") {
            "title" => title = field.text().await.unwrap(),
            "file" => file_bytes = field.bytes().await.unwrap().len(),
            _ => {
                field.bytes().await.unwrap();
            }
        }
    }
    assert!(file_bytes > 0, "upload carried no file bytes");

    let mut backend = backend.lock().unwrap();
    if backend.fail_uploads {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Upload failed"})),
        );
    }
    let video = video_json(Uuid::new_v4(), &title, "uploaded");
    backend.videos.insert(0, video.clone());
    (
        StatusCode::CREATED,
        Json(json!({
            "video": video,
            "message": "Video uploaded successfully and processing started"
        })),
    )
}

async fn analyze_video(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(_config): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let backend = backend.lock().unwrap();
    if backend.fail_analyze {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Analysis failed to start"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"message": "Video analysis started", "video_id": id})),
    )
}

async fn video_status(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let backend = backend.lock().unwrap();
    let status = backend
        .status_overrides
        .get(&id)
        .cloned()
        .unwrap_or_else(|| "completed".to_string());
    (
        StatusCode::OK,
        Json(json!({
            "video_id": id,
            "status": status,
            "events_count": 3,
            "violations_count": 1
        })),
    )
}

async fn video_events(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut backend = backend.lock().unwrap();
    backend.last_events_query = Some(params.clone());
    let mut events = backend.events.get(&id).cloned().unwrap_or_default();
    if let Some(severity) = params.get("severity") {
        events.retain(|event| event["severity"] == json!(severity));
    }
    (
        StatusCode::OK,
        Json(wrap_list(backend.plain_lists, events)),
    )
}

async fn delete_video(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    let mut backend = backend.lock().unwrap();
    if backend.fail_delete {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    backend.videos.retain(|v| v["id"] != json!(id));
    StatusCode::NO_CONTENT
}

async fn list_conversations(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let backend = backend.lock().unwrap();
    (
        StatusCode::OK,
        Json(wrap_list(backend.plain_lists, backend.conversations.clone())),
    )
}

async fn create_conversation(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let conversation = json!({
        "id": Uuid::new_v4(),
        "video": body.get("video_id").cloned().unwrap_or(Value::Null),
        "title": null
    });
    backend
        .lock()
        .unwrap()
        .conversations
        .insert(0, conversation.clone());
    (StatusCode::CREATED, Json(conversation))
}

async fn list_messages(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let backend = backend.lock().unwrap();
    let messages = backend.messages.get(&id).cloned().unwrap_or_default();
    (
        StatusCode::OK,
        Json(wrap_list(backend.plain_lists, messages)),
    )
}

async fn send_message(
    State(backend): State<SharedBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let backend = backend.lock().unwrap();
    if backend.fail_sends {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Inference backend unavailable"})),
        );
    }
    let conversation_id = body
        .get("conversation_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    (
        StatusCode::OK,
        Json(json!({"conversation_id": conversation_id, "message": "queued"})),
    )
}

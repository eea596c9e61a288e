// src/models/video.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Server-side processing state of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: VideoStatus,
    #[serde(default)]
    pub events_count: u32,
    #[serde(default)]
    pub violations_count: u32,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Violation,
    Critical,
}

/// One analysis event detected in a video. Read-only on the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoEvent {
    pub id: Uuid,
    #[serde(default)]
    pub video: Option<Uuid>,
    pub event_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: EventSeverity,
    /// Seconds from the start of the video.
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub is_violation: bool,
}

/// Payload of `GET /videos/{id}/status/`.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatusReport {
    pub video_id: Uuid,
    pub status: VideoStatus,
    #[serde(default)]
    pub events_count: u32,
    #[serde(default)]
    pub violations_count: u32,
    #[serde(default)]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processing_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processing_error: Option<String>,
}

/// Analysis configuration sent to `POST /videos/{id}/analyze/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisConfig {
    pub analysis_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
}

/// User-supplied fields accompanying a video upload.
#[derive(Debug, Clone, Default)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub analysis_types: Vec<String>,
}

/// `POST /videos/upload/` answers 201 with the created video wrapped in an
/// envelope.
#[derive(Debug, Deserialize)]
pub struct VideoUploadResponse {
    pub video: Video,
    #[serde(default)]
    pub message: Option<String>,
}

// src/stores/video.rs
use crate::api_client::ApiClient;
use crate::error::ApiError;
use crate::models::video::{
    AnalysisConfig, UploadMetadata, Video, VideoEvent, VideoStatus, VideoStatusReport,
    VideoUploadResponse,
};
use crate::models::ListEnvelope;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio_util::io::ReaderStream;
use tracing::{error, info};
use uuid::Uuid;

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Default)]
struct VideoState {
    videos: Vec<Video>,
    current: Option<Video>,
}

struct VideoStoreInner {
    api: ApiClient,
    state: RwLock<VideoState>,
    loading: watch::Sender<bool>,
    /// Shared upload progress counter, 0-100. One upload is tracked at a time;
    /// the generation below decides which one owns the counter.
    progress: watch::Sender<u8>,
    upload_generation: AtomicU64,
}

/// Single source of truth for the session's videos and the currently viewed
/// video. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct VideoStore {
    inner: Arc<VideoStoreInner>,
}

impl VideoStore {
    pub fn new(api: ApiClient) -> Self {
        let (loading, _) = watch::channel(false);
        let (progress, _) = watch::channel(0u8);
        Self {
            inner: Arc::new(VideoStoreInner {
                api,
                state: RwLock::new(VideoState::default()),
                loading,
                progress,
                upload_generation: AtomicU64::new(0),
            }),
        }
    }

    pub async fn videos(&self) -> Vec<Video> {
        self.inner.state.read().await.videos.clone()
    }

    pub async fn current(&self) -> Option<Video> {
        self.inner.state.read().await.current.clone()
    }

    pub async fn set_current(&self, video: Option<Video>) {
        self.inner.state.write().await.current = video;
    }

    pub fn upload_progress(&self) -> u8 {
        *self.inner.progress.borrow()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.inner.progress.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Fetch every video for the session and replace the local collection.
    /// On failure the previous collection is left untouched.
    pub async fn list(&self) -> Result<Vec<Video>, ApiError> {
        self.inner.loading.send_replace(true);
        let result = self
            .inner
            .api
            .get_json::<ListEnvelope<Video>>("/videos/")
            .await;
        self.inner.loading.send_replace(false);

        match result {
            Ok(envelope) => {
                let mut videos = envelope.into_items();
                // Keyed collection: at most one entry per id.
                let mut seen = HashSet::new();
                videos.retain(|video| seen.insert(video.id));
                info!("📼 Loaded {} videos", videos.len());
                let mut state = self.inner.state.write().await;
                state.videos = videos.clone();
                Ok(videos)
            }
            Err(e) => {
                error!("Failed to fetch videos: {}", e);
                Err(e)
            }
        }
    }

    /// Fetch one video and make it current.
    pub async fn get(&self, id: Uuid) -> Result<Video, ApiError> {
        let video = self
            .inner
            .api
            .get_json::<Video>(&format!("/videos/{}/", id))
            .await
            .map_err(|e| {
                error!("Failed to fetch video {}: {}", id, e);
                e
            })?;
        self.inner.state.write().await.current = Some(video.clone());
        Ok(video)
    }

    /// Upload an in-memory file. Progress is observable on the watch channel
    /// returned by [`subscribe_progress`](Self::subscribe_progress): it starts
    /// at 0, never decreases while the bytes go out, and returns to 0 once the
    /// upload settles either way.
    pub async fn upload(
        &self,
        file_name: &str,
        data: Vec<u8>,
        metadata: UploadMetadata,
    ) -> Result<Video, ApiError> {
        let generation = self.begin_upload();
        let total = data.len() as u64;
        let body = progress_body(data, self.progress_reporter(generation));
        self.submit_upload(generation, file_name, body, total, metadata)
            .await
    }

    /// Upload a file from disk, streaming it rather than buffering.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        metadata: UploadMetadata,
    ) -> Result<Video, ApiError> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.bin")
            .to_string();

        let generation = self.begin_upload();
        let mut report = self.progress_reporter(generation);
        let denominator = total.max(1);
        let stream = ReaderStream::new(file).scan(0u64, move |sent, chunk| {
            if let Ok(bytes) = &chunk {
                *sent += bytes.len() as u64;
                report(((*sent * 100) / denominator).min(100) as u8);
            }
            futures::future::ready(Some(chunk))
        });
        self.submit_upload(
            generation,
            &file_name,
            Body::wrap_stream(stream),
            total,
            metadata,
        )
        .await
    }

    /// Claim the shared progress counter for a new upload.
    fn begin_upload(&self) -> u64 {
        let generation = self.inner.upload_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.progress.send_replace(0);
        generation
    }

    /// Progress callback bound to one upload generation. Readings from a
    /// superseded upload are dropped, and the counter only moves forward.
    fn progress_reporter(&self, generation: u64) -> impl FnMut(u8) + Send + 'static {
        let inner = self.inner.clone();
        move |pct| {
            if inner.upload_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            inner.progress.send_if_modified(|current| {
                if pct > *current {
                    *current = pct;
                    true
                } else {
                    false
                }
            });
        }
    }

    async fn submit_upload(
        &self,
        generation: u64,
        file_name: &str,
        body: Body,
        total: u64,
        metadata: UploadMetadata,
    ) -> Result<Video, ApiError> {
        let part = Part::stream_with_length(body, total)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .text("title", metadata.title)
            .text("description", metadata.description)
            .text(
                "analysis_types",
                serde_json::to_string(&metadata.analysis_types)?,
            )
            .part("file", part);

        let result = self
            .inner
            .api
            .post_multipart::<VideoUploadResponse>("/videos/upload/", form)
            .await;

        // Reset the shared counter unless a newer upload already owns it.
        if self.inner.upload_generation.load(Ordering::SeqCst) == generation {
            self.inner.progress.send_replace(0);
        }

        match result {
            Ok(response) => {
                let video = response.video;
                let mut state = self.inner.state.write().await;
                state.videos.retain(|v| v.id != video.id);
                state.videos.insert(0, video.clone());
                info!("✅ Uploaded video '{}' ({})", video.title, video.id);
                Ok(video)
            }
            Err(e) => {
                error!("Upload failed: {}", e);
                Err(e)
            }
        }
    }

    /// Trigger server-side analysis. The local entry is optimistically marked
    /// `processing` without waiting for the backend to confirm the transition.
    pub async fn start_analysis(
        &self,
        id: Uuid,
        config: &AnalysisConfig,
    ) -> Result<Value, ApiError> {
        let data = self
            .inner
            .api
            .post_json::<_, Value>(&format!("/videos/{}/analyze/", id), config)
            .await
            .map_err(|e| {
                error!("Failed to start analysis for {}: {}", id, e);
                e
            })?;
        self.apply_status(id, VideoStatus::Processing).await;
        info!("🔎 Analysis started for video {}", id);
        Ok(data)
    }

    /// Fetch the latest processing status and merge it into the matching local
    /// entry. An id we do not hold locally is left alone: no entry is created.
    pub async fn poll_status(&self, id: Uuid) -> Result<VideoStatusReport, ApiError> {
        let report = self
            .inner
            .api
            .get_json::<VideoStatusReport>(&format!("/videos/{}/status/", id))
            .await
            .map_err(|e| {
                error!("Failed to fetch status for {}: {}", id, e);
                e
            })?;

        let mut state = self.inner.state.write().await;
        if let Some(video) = state.videos.iter_mut().find(|v| v.id == id) {
            video.status = report.status;
            video.events_count = report.events_count;
            video.violations_count = report.violations_count;
        }
        if let Some(current) = state.current.as_mut() {
            if current.id == id {
                current.status = report.status;
                current.events_count = report.events_count;
                current.violations_count = report.violations_count;
            }
        }
        Ok(report)
    }

    /// Read-through event fetch; nothing is cached, every call hits the
    /// network. Filters become query parameters as-is.
    pub async fn list_events(
        &self,
        id: Uuid,
        filters: &[(String, String)],
    ) -> Result<Vec<VideoEvent>, ApiError> {
        let envelope = self
            .inner
            .api
            .get_json_with_query::<ListEnvelope<VideoEvent>>(
                &format!("/videos/{}/events/", id),
                filters,
            )
            .await
            .map_err(|e| {
                error!("Failed to fetch events for {}: {}", id, e);
                e
            })?;
        Ok(envelope.into_items())
    }

    /// Delete server-side first; the local entry goes away only on confirmed
    /// success.
    pub async fn remove(&self, id: Uuid) -> Result<(), ApiError> {
        self.inner
            .api
            .delete(&format!("/videos/{}/", id))
            .await
            .map_err(|e| {
                error!("Failed to delete video {}: {}", id, e);
                e
            })?;

        let mut state = self.inner.state.write().await;
        state.videos.retain(|v| v.id != id);
        if state.current.as_ref().map(|v| v.id) == Some(id) {
            state.current = None;
        }
        info!("🗑️ Deleted video {}", id);
        Ok(())
    }

    async fn apply_status(&self, id: Uuid, status: VideoStatus) {
        let mut state = self.inner.state.write().await;
        if let Some(video) = state.videos.iter_mut().find(|v| v.id == id) {
            video.status = status;
        }
        if let Some(current) = state.current.as_mut() {
            if current.id == id {
                current.status = status;
            }
        }
    }
}

/// Wrap raw bytes in a chunked body that reports cumulative percentage as the
/// chunks are pulled off by the transport.
fn progress_body<F>(data: Vec<u8>, mut report: F) -> Body
where
    F: FnMut(u8) + Send + 'static,
{
    let total = data.len().max(1) as u64;
    let chunks: Vec<Vec<u8>> = data.chunks(UPLOAD_CHUNK_BYTES).map(<[u8]>::to_vec).collect();
    let stream = futures::stream::iter(chunks).scan(0u64, move |sent, chunk| {
        *sent += chunk.len() as u64;
        report(((*sent * 100) / total).min(100) as u8);
        futures::future::ready(Some(Ok::<_, std::io::Error>(chunk)))
    });
    Body::wrap_stream(stream)
}

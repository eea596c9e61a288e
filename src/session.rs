// src/session.rs
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Identity of the authenticated dashboard user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Default)]
struct SessionData {
    token: Option<String>,
    user: Option<UserProfile>,
}

/// Shared auth session holder.
///
/// The stores never cache the token; they read it from here at call time, so
/// a logout takes effect on the next request.
#[derive(Clone, Default)]
pub struct AuthSession {
    inner: Arc<RwLock<SessionData>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn authenticate(&self, user: UserProfile, token: String) {
        let mut data = self.inner.write().await;
        data.user = Some(user);
        data.token = Some(token);
        tracing::info!("🔑 Session authenticated");
    }

    pub async fn clear(&self) {
        let mut data = self.inner.write().await;
        data.user = None;
        data.token = None;
        tracing::info!("Session cleared");
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.inner.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.token.is_some()
    }
}

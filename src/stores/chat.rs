// src/stores/chat.rs
use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::chat::{
    ChatMessage, Conversation, SendMessageRequest, SendMessageResponse,
};
use crate::models::ListEnvelope;
use rand::Rng;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Canned assistant replies. Placeholder for a real inference backend; the
/// choice only token-matches the outgoing message, it does not read the video.
pub const ASSISTANT_TEMPLATES: [&str; 6] = [
    "I've analyzed your video and found several interesting events. Would you like me to highlight the most significant ones?",
    "Based on the video content, I detected some potential guideline violations. Let me show you the specific timestamps where these occurred.",
    "The video analysis is complete! I found multiple objects and activities. What specific aspect would you like to explore further?",
    "I can see there are some traffic patterns in your video. Would you like me to explain the movement patterns I detected?",
    "Great question! Let me break down the analysis results for you. I found several key events that might be of interest.",
    "I've processed the video and identified various events. The analysis shows some interesting patterns in the timeline.",
];

/// Pick a reply template for the simulated assistant turn.
pub fn assistant_reply(user_content: &str) -> String {
    let lowered = user_content.to_lowercase();
    if lowered.contains("violation") || lowered.contains("guideline") {
        return ASSISTANT_TEMPLATES[1].to_string();
    }
    if lowered.contains("traffic") || lowered.contains("movement") {
        return ASSISTANT_TEMPLATES[3].to_string();
    }
    let index = rand::thread_rng().gen_range(0..ASSISTANT_TEMPLATES.len());
    ASSISTANT_TEMPLATES[index].to_string()
}

#[derive(Default)]
struct ChatState {
    conversations: Vec<Conversation>,
    current: Option<Conversation>,
    messages: Vec<ChatMessage>,
}

struct ChatStoreInner {
    api: ApiClient,
    state: RwLock<ChatState>,
    loading: watch::Sender<bool>,
    typing: watch::Sender<bool>,
    /// Each send claims a new generation; the delayed assistant task only
    /// lands if its generation is still the latest.
    send_generation: AtomicU64,
    reply_delay: Duration,
}

/// Owns conversation selection and the message timeline for the active
/// conversation, and simulates assistant turn-taking. Cheap to clone.
#[derive(Clone)]
pub struct ChatStore {
    inner: Arc<ChatStoreInner>,
}

impl ChatStore {
    pub fn new(api: ApiClient, reply_delay: Duration) -> Self {
        let (loading, _) = watch::channel(false);
        let (typing, _) = watch::channel(false);
        Self {
            inner: Arc::new(ChatStoreInner {
                api,
                state: RwLock::new(ChatState::default()),
                loading,
                typing,
                send_generation: AtomicU64::new(0),
                reply_delay,
            }),
        }
    }

    /// Build a store with the reply delay taken from configuration.
    pub fn from_config(api: ApiClient, config: &ClientConfig) -> Self {
        Self::new(api, config.assistant_reply_delay)
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.inner.state.read().await.conversations.clone()
    }

    pub async fn current_conversation(&self) -> Option<Conversation> {
        self.inner.state.read().await.current.clone()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.inner.state.read().await.messages.clone()
    }

    pub fn typing(&self) -> bool {
        *self.inner.typing.borrow()
    }

    pub fn subscribe_typing(&self) -> watch::Receiver<bool> {
        self.inner.typing.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Load all conversations for the session, replacing the local collection.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let envelope = self
            .inner
            .api
            .get_json::<ListEnvelope<Conversation>>("/chat/conversations/")
            .await
            .map_err(|e| {
                error!("Failed to fetch conversations: {}", e);
                e
            })?;
        let conversations = envelope.into_items();
        info!("💬 Loaded {} conversations", conversations.len());
        self.inner.state.write().await.conversations = conversations.clone();
        Ok(conversations)
    }

    /// Make a conversation current and pull its messages. Selecting `None`
    /// clears the timeline without a network call.
    pub async fn select_conversation(
        &self,
        conversation: Option<Conversation>,
    ) -> Result<(), ApiError> {
        match conversation {
            Some(conversation) => {
                let id = conversation.id;
                self.inner.state.write().await.current = Some(conversation);
                self.fetch_messages(id).await.map(|_| ())
            }
            None => {
                let mut state = self.inner.state.write().await;
                state.current = None;
                state.messages.clear();
                Ok(())
            }
        }
    }

    /// Fetch the timeline for a conversation and replace the local one.
    pub async fn fetch_messages(&self, conversation_id: Uuid) -> Result<Vec<ChatMessage>, ApiError> {
        self.inner.loading.send_replace(true);
        let result = self
            .inner
            .api
            .get_json::<ListEnvelope<ChatMessage>>(&format!(
                "/chat/conversations/{}/messages/",
                conversation_id
            ))
            .await;
        self.inner.loading.send_replace(false);

        match result {
            Ok(envelope) => {
                let messages = envelope.into_items();
                self.inner.state.write().await.messages = messages.clone();
                Ok(messages)
            }
            Err(e) => {
                error!("Failed to fetch messages for {}: {}", conversation_id, e);
                Err(e)
            }
        }
    }

    /// Create a conversation, insert it at the front, make it current, and
    /// start with an empty timeline.
    pub async fn create_conversation(
        &self,
        video_id: Option<Uuid>,
    ) -> Result<Conversation, ApiError> {
        let conversation = self
            .inner
            .api
            .post_json::<_, Conversation>("/chat/conversations/", &json!({ "video_id": video_id }))
            .await
            .map_err(|e| {
                error!("Failed to create conversation: {}", e);
                e
            })?;

        let mut state = self.inner.state.write().await;
        state.conversations.insert(0, conversation.clone());
        state.current = Some(conversation.clone());
        state.messages.clear();
        info!("💬 Created conversation {}", conversation.id);
        Ok(conversation)
    }

    /// Two-phase send. Phase one posts to the backend and, on success, echoes
    /// the user's message into the timeline with a client-generated id and
    /// timestamp. Phase two raises the typing flag and, after the configured
    /// delay, appends a templated assistant reply and lowers the flag — a
    /// stand-in for a backend push, not a real inference result.
    ///
    /// A failed send leaves the timeline untouched and the typing flag down.
    /// A newer send supersedes the pending assistant turn of an older one.
    pub async fn send_message(
        &self,
        content: &str,
        conversation_id: Option<Uuid>,
        video_id: Option<Uuid>,
    ) -> Result<SendMessageResponse, ApiError> {
        let request = SendMessageRequest {
            content: content.to_string(),
            conversation_id,
            video_id,
        };
        let response = self
            .inner
            .api
            .post_json::<_, SendMessageResponse>("/chat/send-message/", &request)
            .await
            .map_err(|e| {
                error!("Failed to send message: {}", e);
                e
            })?;

        {
            let mut state = self.inner.state.write().await;
            state.messages.push(ChatMessage::local_user(content));

            // The backend may have opened a conversation for us.
            if conversation_id.is_none() {
                if let Some(new_id) = response.conversation_id {
                    let already_current = state.current.as_ref().map(|c| c.id) == Some(new_id);
                    if !already_current {
                        state.current = Some(Conversation {
                            id: new_id,
                            video: video_id,
                            title: None,
                            created_at: None,
                        });
                    }
                }
            }
        }

        let generation = self.inner.send_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.typing.send_replace(true);
        let reply = assistant_reply(content);
        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(inner.reply_delay).await;
            if inner.send_generation.load(Ordering::SeqCst) != generation {
                debug!("Assistant turn superseded by a newer send, dropping it");
                return;
            }
            let mut state = inner.state.write().await;
            state.messages.push(ChatMessage::local_assistant(reply));
            inner.typing.send_replace(false);
        });

        Ok(response)
    }
}

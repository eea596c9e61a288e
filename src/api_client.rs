// src/api_client.rs
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::AuthSession;
use reqwest::multipart::Form;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// Thin wrapper around `reqwest::Client` that pins the backend base URL and
/// attaches the session token to every request.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: AuthSession,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: AuthSession) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            session,
        }
    }

    pub fn from_config(config: &ClientConfig, session: AuthSession) -> Self {
        Self::new(config.api_base_url.clone(), session)
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Backend uses DRF token auth; the header is bearer-style but spelled
    /// `Token`, not `Bearer`.
    async fn auth_header(&self) -> Result<String, ApiError> {
        match self.session.token().await {
            Some(token) => Ok(format!("Token {}", token)),
            None => Err(ApiError::AuthMissing),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_json_with_query(path, &[]).await
    }

    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let auth = self.auth_header().await?;
        let mut request = self.client.get(self.url(path)).header("Authorization", auth);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let auth = self.auth_header().await?;
        let response = self
            .client
            .post(self.url(path))
            .header("Authorization", auth)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let auth = self.auth_header().await?;
        let response = self
            .client
            .post(self.url(path))
            .header("Authorization", auth)
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let auth = self.auth_header().await?;
        let response = self
            .client
            .delete(self.url(path))
            .header("Authorization", auth)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            error!("DELETE {} rejected ({}): {}", path, status, message);
            return Err(ApiError::Server { status, message });
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(response).await;
            error!("Backend rejected request ({}): {}", status, message);
            return Err(ApiError::Server { status, message });
        }
        // Decode by hand so a malformed 2xx body is a Decode error, not a
        // transport error.
        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| {
            error!("Failed to decode response body: {}", e);
            ApiError::Decode(e)
        })
    }

    /// Pull a human-readable message out of an error body. The backend is not
    /// consistent about the key it uses.
    async fn error_message(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            for key in ["error", "message", "detail"] {
                if let Some(message) = value.get(key).and_then(Value::as_str) {
                    return message.to_string();
                }
            }
        }
        if body.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body
        }
    }
}

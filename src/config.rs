// src/config.rs
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_REPLY_DELAY_MS: u64 = 1500;

/// Runtime configuration for the dashboard client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Visual Insight REST backend, without a trailing slash.
    pub api_base_url: String,
    /// Delay before the simulated assistant reply is appended to the timeline.
    pub assistant_reply_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            assistant_reply_delay: Duration::from_millis(DEFAULT_REPLY_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment (and a `.env` file if present).
    ///
    /// Recognized variables: `VISUAL_INSIGHT_API_URL`, `VISUAL_INSIGHT_REPLY_DELAY_MS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_base_url = std::env::var("VISUAL_INSIGHT_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let assistant_reply_delay = std::env::var("VISUAL_INSIGHT_REPLY_DELAY_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_REPLY_DELAY_MS));

        Self {
            api_base_url,
            assistant_reply_delay,
        }
    }
}

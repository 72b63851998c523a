use std::env;

use log::warn;

/// Hosted interview-chat endpoint used when no override is configured.
pub const DEFAULT_CHAT_URL: &str = "https://api.fluentmate.dev/v1/interview-chat";

/// Connection settings for the remote chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ChatConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Load settings from the environment, reading a `.env` file first when
    /// one is present. `FLUENTMATE_CHAT_URL` overrides the hosted endpoint;
    /// `FLUENTMATE_API_KEY` is attached as a bearer token when set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url =
            env::var("FLUENTMATE_CHAT_URL").unwrap_or_else(|_| DEFAULT_CHAT_URL.to_string());
        let api_key = env::var("FLUENTMATE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        if api_key.is_none() {
            warn!("FLUENTMATE_API_KEY not set - requests will be sent unauthenticated");
        }

        Self { base_url, api_key }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_URL, None)
    }
}

use std::time::Duration;

use log::{error, info};
use reqwest::Client;

use crate::config::ChatConfig;

use super::error::ChatError;
use super::{ChatMessage, InterviewCategory};

/// Thin HTTP client for the interview-chat endpoint. The endpoint accepts a
/// JSON body of role-tagged messages plus a category tag and answers with an
/// event-stream body decoded by [`crate::sse::SseDecoder`].
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
        }
    }

    /// Issue a chat request and hand back the raw streaming response.
    /// Non-2xx statuses are mapped to the user-facing error taxonomy here so
    /// callers only ever see typed failures.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        category: InterviewCategory,
    ) -> Result<reqwest::Response, ChatError> {
        let payload = serde_json::json!({
            "messages": messages,
            "category": category.as_str(),
        });

        info!(
            "requesting interview turn: category={}, history={} messages",
            category,
            messages.len()
        );

        let mut request = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&payload);

        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("chat endpoint error {}: {}", status, body);
            return Err(match status.as_u16() {
                429 => ChatError::RateLimited,
                402 => ChatError::ServiceUnavailable,
                code => ChatError::Http { status: code, body },
            });
        }

        Ok(response)
    }
}

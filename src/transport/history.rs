use async_trait::async_trait;
use log::{debug, info, warn};

use crate::core::error::ChatError;
use crate::core::types::{ConversationId, Message};

/// Source of a conversation's prior messages.
#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn fetch(&self, id: &ConversationId) -> Result<Vec<Message>, ChatError>;
}

/// `GET {base_url}/messages/{id}` → JSON array of messages.
pub struct HttpHistory {
    base_url: String,
    client: reqwest::Client,
}

impl HttpHistory {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn messages_url(&self, id: &ConversationId) -> String {
        format!("{}/messages/{}", self.base_url, id)
    }
}

#[async_trait]
impl HistoryService for HttpHistory {
    async fn fetch(&self, id: &ConversationId) -> Result<Vec<Message>, ChatError> {
        let url = self.messages_url(id);
        info!("Fetching history: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::history(e.to_string()))?;

        debug!("History response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("History endpoint error: {} - {}", status, body);
            return Err(ChatError::HistoryFetchFailed {
                status: Some(status),
                message: body,
            });
        }

        response
            .json::<Vec<Message>>()
            .await
            .map_err(|e| ChatError::history(format!("invalid history body: {e}")))
    }
}

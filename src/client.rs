use std::time::Duration;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Serialize)]
struct QueryRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    response: String,
}

/// Why a query did not produce a reply.
///
/// The chat screen only distinguishes `Cancelled` from everything else;
/// the other variants exist so the log says what actually went wrong.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response body: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
}

#[derive(Clone)]
pub struct FinSageClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl FinSageClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }

    /// POST `{ "text": .. }` to `/query` and return the `response` field.
    pub async fn query(&self, text: &str, cancel: &CancellationToken) -> Result<String, ChatError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ChatError::Cancelled),
            result = self.send(text) => result,
        }
    }

    async fn send(&self, text: &str) -> Result<String, ChatError> {
        let url = self.query_url();

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&QueryRequest { text })
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    ChatError::Timeout(self.timeout)
                } else {
                    ChatError::Network { url: url.clone(), source }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        let body: QueryResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Timeout(self.timeout)
            } else {
                ChatError::Decode(e)
            }
        })?;
        Ok(body.response)
    }
}

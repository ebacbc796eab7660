use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::timeout;

use crate::cancel::CancelToken;
use crate::config::ApiConfig;

use super::error::ApiError;
use super::legacy;
use super::types::{CommentLikeResponse, ReactionSummary, ReactionType, UserReactionResponse};
use super::ReactionApi;

const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// reqwest-backed client for the SkillBridge REST API.
///
/// Each call is bounded by the configured request timeout (treated as a
/// transient failure) and aborts as soon as its cancellation token fires.
pub struct RestClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    accept_legacy_shapes: bool,
}

impl RestClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            accept_legacy_shapes: config.accept_legacy_shapes,
        })
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send one request and read the whole body, honouring timeout and
    /// cancellation. Non-success statuses become [`ApiError::Status`].
    async fn call(
        &self,
        method: Method,
        url: Url,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, ApiError> {
        let endpoint = format!("{} {}", method, url.path());
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        tracing::debug!(endpoint = %endpoint, "Sending request");
        let request = self.client.request(method, url);
        let exchange = async move {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        };

        let (status, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            result = timeout(self.request_timeout, exchange) => match result {
                Err(_) => {
                    return Err(ApiError::Timeout {
                        duration_ms: self.request_timeout.as_millis() as u64,
                    })
                }
                Ok(Err(e)) if e.is_timeout() => {
                    return Err(ApiError::Timeout {
                        duration_ms: self.request_timeout.as_millis() as u64,
                    })
                }
                Ok(Err(e)) => return Err(ApiError::Network { url: endpoint, source: e }),
                Ok(Ok(pair)) => pair,
            },
        };

        tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "Received response");

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(body)
    }

    fn decode_summary(&self, endpoint: &str, body: &[u8]) -> Result<ReactionSummary, ApiError> {
        match decode::<ReactionSummary>(endpoint, body) {
            Ok(summary) => Ok(summary),
            Err(err) if self.accept_legacy_shapes => serde_json::from_slice::<Value>(body)
                .ok()
                .as_ref()
                .and_then(legacy::summary_from_legacy)
                .inspect(|_| tracing::debug!(endpoint, "Decoded legacy summary shape"))
                .ok_or(err),
            Err(err) => Err(err),
        }
    }

    fn decode_user_reaction(
        &self,
        endpoint: &str,
        body: &[u8],
    ) -> Result<Option<ReactionType>, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        match decode::<UserReactionResponse>(endpoint, body) {
            Ok(resp) => Ok(resp.reaction_type),
            Err(err) if self.accept_legacy_shapes => serde_json::from_slice::<Value>(body)
                .ok()
                .as_ref()
                .and_then(legacy::user_reaction_from_legacy)
                .ok_or(err),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl ReactionApi for RestClient {
    async fn fetch_summary(
        &self,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError> {
        let url = self.url(&["api", "reactions", "post", post_id], &[])?;
        let body = self.call(Method::GET, url, cancel).await?;
        self.decode_summary("GET /api/reactions/post", &body)
    }

    async fn fetch_user_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<Option<ReactionType>, ApiError> {
        let url = self.url(
            &["api", "reactions", "user"],
            &[("userId", user_id), ("postId", post_id)],
        )?;
        match self.call(Method::GET, url, cancel).await {
            Ok(body) => self.decode_user_reaction("GET /api/reactions/user", &body),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn set_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        reaction: ReactionType,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError> {
        let url = self.url(
            &["api", "reactions"],
            &[
                ("userId", user_id),
                ("postId", post_id),
                ("type", reaction.as_str()),
            ],
        )?;
        let body = self.call(Method::POST, url, cancel).await?;
        self.decode_summary("POST /api/reactions", &body)
    }

    async fn clear_reaction(
        &self,
        user_id: &str,
        post_id: &str,
        cancel: &CancelToken,
    ) -> Result<ReactionSummary, ApiError> {
        let url = self.url(
            &["api", "reactions"],
            &[("userId", user_id), ("postId", post_id)],
        )?;
        let body = self.call(Method::DELETE, url, cancel).await?;
        self.decode_summary("DELETE /api/reactions", &body)
    }

    async fn toggle_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
        cancel: &CancelToken,
    ) -> Result<CommentLikeResponse, ApiError> {
        let url = self.url(
            &["api", "comments", comment_id, "react"],
            &[("userId", user_id), ("reactionType", "like")],
        )?;
        let body = self.call(Method::POST, url, cancel).await?;
        decode("POST /api/comments/react", &body)
    }

    async fn health(&self, cancel: &CancelToken) -> Result<(), ApiError> {
        let url = self.url(&["api", "health"], &[])?;
        self.call(Method::GET, url, cancel).await.map(|_| ())
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Pull a readable message out of an error body (`{"error": ".."}`,
/// `{"message": ".."}`, or plain text).
fn error_message(body: &[u8]) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        if let Some(Value::String(message)) = map.get("error").or_else(|| map.get("message")) {
            return message.clone();
        }
    }
    String::from_utf8_lossy(body)
        .trim()
        .chars()
        .take(MAX_ERROR_MESSAGE_LEN)
        .collect()
}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ApiError, ApiResult, Upstream};
use crate::http::{join_url, truncate_body};
use crate::interfaces::ChatApi;
use crate::types::{ApiReply, ChatMessage};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

/// Slack Web API client authenticated with a bot token.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    bot_token: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

impl SlackClient {
    pub fn new(http: reqwest::Client, bot_token: impl Into<String>, api_base: Option<String>) -> Self {
        Self {
            http,
            bot_token: bot_token.into(),
            api_base: api_base.unwrap_or_else(|| DEFAULT_SLACK_API_BASE.into()),
        }
    }

    fn build_url(&self, method: &str) -> String {
        join_url(&self.api_base, method)
    }

    fn net(err: reqwest::Error) -> ApiError {
        ApiError::Transport {
            upstream: Upstream::Slack,
            source: err,
        }
    }

    async fn post_json(&self, method: &str, payload: Value) -> ApiResult<ApiReply> {
        let response = self
            .http
            .post(self.build_url(method))
            .bearer_auth(&self.bot_token)
            .json(&payload)
            .send()
            .await
            .map_err(Self::net)?;
        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(Self::net)?;
        let raw: Value = serde_json::from_str(&body_text)
            .unwrap_or_else(|_| Value::String(truncate_body(&body_text)));
        debug!(method, status, "slack write completed");
        Ok(ApiReply::from_body(status, raw))
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn recent_messages(&self, channel: &str, limit: u32) -> ApiResult<Vec<ChatMessage>> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(self.build_url("conversations.history"))
            .bearer_auth(&self.bot_token)
            .query(&[("channel", channel), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(Self::net)?;

        let status = response.status();
        let body_text = response.text().await.map_err(Self::net)?;
        if !status.is_success() {
            return Err(ApiError::Status {
                upstream: Upstream::Slack,
                status: status.as_u16(),
                body: truncate_body(&body_text),
            });
        }

        let history: HistoryResponse =
            serde_json::from_str(&body_text).map_err(|source| ApiError::Decode {
                upstream: Upstream::Slack,
                source,
            })?;
        if !history.ok {
            return Err(ApiError::Rejected {
                upstream: Upstream::Slack,
                error: history.error.unwrap_or_else(|| "unknown".into()),
            });
        }
        Ok(history.messages)
    }

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> ApiResult<ApiReply> {
        self.post_json(
            "reactions.add",
            json!({
                "channel": channel,
                "timestamp": ts,
                "name": name,
            }),
        )
        .await
    }

    async fn post_thread_reply(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> ApiResult<ApiReply> {
        self.post_json(
            "chat.postMessage",
            json!({
                "channel": channel,
                "thread_ts": thread_ts,
                "text": text,
            }),
        )
        .await
    }
}

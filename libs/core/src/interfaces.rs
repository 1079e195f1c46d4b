//! Seams between the notifier pipeline and the two upstream REST APIs.
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{ApiReply, ChatMessage, Metafield};

/// Read access to the commerce platform.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// Fetches every metafield attached to `order_id`, in API order.
    async fn order_metafields(&self, order_id: &str) -> ApiResult<Vec<Metafield>>;
}

/// Read/write access to the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Returns up to `limit` of the most recent messages in `channel`, newest first.
    async fn recent_messages(&self, channel: &str, limit: u32) -> ApiResult<Vec<ChatMessage>>;

    /// Adds emoji `name` to the message at `ts`. `Err` only for transport failures.
    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> ApiResult<ApiReply>;

    /// Posts `text` as a reply inside the thread rooted at `thread_ts`.
    /// `Err` only for transport failures.
    async fn post_thread_reply(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> ApiResult<ApiReply>;
}

pub type SharedCommerceApi = Arc<dyn CommerceApi>;
pub type SharedChatApi = Arc<dyn ChatApi>;

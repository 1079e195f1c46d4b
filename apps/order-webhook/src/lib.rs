//! Shopify `orders/updated` webhook that announces restocked orders in their Slack thread.
pub mod config;
pub mod http;
pub mod pipeline;

use std::sync::Arc;

use anyhow::{Context, Result};
use osn_core::{ShopifyClient, SlackClient, http::build_client};
use osn_idempotency::InMemoryDedupStore;
use osn_session::shared_memory_cache;

pub use config::{ConfigError, WebhookConfig};
pub use http::build_router;
pub use pipeline::{Collaborators, OrderPipeline, WebhookOutcome};

/// Wires the live Shopify and Slack clients with in-process stores.
pub fn build_pipeline(config: &WebhookConfig) -> Result<Arc<OrderPipeline>> {
    let http = build_client(config.http_timeout).context("building http client")?;
    let commerce = ShopifyClient::new(
        http.clone(),
        config.shopify_token.clone(),
        config.shopify_api_base.clone(),
        Some(config.shopify_api_version.clone()),
    );
    let chat = SlackClient::new(
        http,
        config.slack_token.clone(),
        config.slack_api_base.clone(),
    );
    let deps = Collaborators {
        commerce: Arc::new(commerce),
        chat: Arc::new(chat),
        threads: shared_memory_cache(),
        dedup: Arc::new(InMemoryDedupStore::new()),
    };
    Ok(Arc::new(OrderPipeline::new(config, deps)))
}

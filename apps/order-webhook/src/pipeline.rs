//! One webhook delivery, end to end: stock gate, dedup claim, thread lookup, reply.
use osn_core::{
    Notifier, OrderRef, OrderUpdate, SharedChatApi, SharedCommerceApi, StockLookup, StockResolver,
    ThreadLookup, ThreadResolver,
};
use osn_idempotency::{Claim, ClaimToken, DedupGuard, DedupKey, SharedDedupStore};
use osn_session::SharedThreadCache;
use osn_telemetry::{record_order_fields, record_outcome, start_webhook_span};
use tracing::{Instrument, Span, error, info, warn};

use crate::config::WebhookConfig;

/// Final state of a delivery. Every variant is answered with HTTP 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Ok,
    Ignored,
    DuplicateIgnored,
    ThreadNotFound,
    MetafieldFetchFailed,
    NotifyFailed,
}

impl WebhookOutcome {
    /// Response body sent back to Shopify.
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Ok => "OK",
            WebhookOutcome::Ignored => "Ignored",
            WebhookOutcome::DuplicateIgnored => "Duplicate ignored",
            WebhookOutcome::ThreadNotFound => "Thread not found",
            WebhookOutcome::MetafieldFetchFailed => "Metafield fetch failed",
            WebhookOutcome::NotifyFailed => "Notify failed",
        }
    }

    /// Metric and span label.
    pub fn label(&self) -> &'static str {
        match self {
            WebhookOutcome::Ok => "ok",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::DuplicateIgnored => "duplicate_ignored",
            WebhookOutcome::ThreadNotFound => "thread_not_found",
            WebhookOutcome::MetafieldFetchFailed => "metafield_fetch_failed",
            WebhookOutcome::NotifyFailed => "notify_failed",
        }
    }
}

impl std::fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream clients and stores the pipeline runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub commerce: SharedCommerceApi,
    pub chat: SharedChatApi,
    pub threads: SharedThreadCache,
    pub dedup: SharedDedupStore,
}

#[derive(Clone)]
pub struct OrderPipeline {
    stock: StockResolver,
    threads: ThreadResolver,
    notifier: Notifier,
    cache: SharedThreadCache,
    dedup: DedupGuard,
}

impl OrderPipeline {
    pub fn new(config: &WebhookConfig, deps: Collaborators) -> Self {
        Self {
            stock: StockResolver::new(deps.commerce),
            threads: ThreadResolver::new(
                deps.chat.clone(),
                deps.threads.clone(),
                config.channel_id.clone(),
                config.history_limit,
            ),
            notifier: Notifier::new(deps.chat, config.notify_options()),
            cache: deps.threads,
            dedup: DedupGuard::new(deps.dedup, &config.dedup),
        }
    }

    /// Handles a raw request body. Unparsable JSON is ignored.
    pub async fn handle_body(&self, body: &[u8]) -> WebhookOutcome {
        match serde_json::from_slice::<OrderUpdate>(body) {
            Ok(update) => self.handle(&update).await,
            Err(err) => {
                warn!(error = %err, "order webhook payload is not valid json; ignoring");
                record_outcome(WebhookOutcome::Ignored.label());
                WebhookOutcome::Ignored
            }
        }
    }

    pub async fn handle(&self, update: &OrderUpdate) -> WebhookOutcome {
        let span = start_webhook_span();
        let outcome = self
            .process(update, &span)
            .instrument(span.clone())
            .await;
        span.record("outcome", outcome.label());
        record_outcome(outcome.label());
        outcome
    }

    async fn process(&self, update: &OrderUpdate, span: &Span) -> WebhookOutcome {
        let Some(order) = update.order_ref() else {
            info!("order webhook without order name; ignoring");
            return WebhookOutcome::Ignored;
        };
        record_order_fields(span, &order.order_number, &order.order_id);
        info!(order_number = %order.order_number, order_id = %order.order_id, "order webhook received");

        if order.order_id.is_empty() {
            warn!(order_number = %order.order_number, "order webhook without order id");
            return WebhookOutcome::MetafieldFetchFailed;
        }

        let status = match self.stock.resolve(&order.order_id).await {
            StockLookup::Available(status) => status,
            StockLookup::NotAvailable(status) => {
                info!(
                    order_number = %order.order_number,
                    status = status.as_deref().unwrap_or("<absent>"),
                    "stock not available; ignoring"
                );
                return WebhookOutcome::Ignored;
            }
            StockLookup::FetchFailed(_) => return WebhookOutcome::MetafieldFetchFailed,
        };

        let key = DedupKey::new(order.order_number.clone(), status);
        let token = match self.dedup.claim(&key).await {
            Ok(Claim::Acquired(token)) => Some(token),
            Ok(Claim::Duplicate) | Ok(Claim::InFlight) => return WebhookOutcome::DuplicateIgnored,
            Err(err) => {
                error!(dedup_key = %key, error = %err, "dedup store unavailable; continuing without dedup");
                None
            }
        };

        let outcome = self.notify_order(&order).await;
        if let Some(token) = token {
            self.settle(&key, token, outcome).await;
        }
        outcome
    }

    async fn notify_order(&self, order: &OrderRef) -> WebhookOutcome {
        let lookup = self.threads.resolve(&order.order_number).await;
        let thread_ts = match &lookup {
            ThreadLookup::Cached(ts) => ts.clone(),
            ThreadLookup::Found(ts) => {
                if let Err(err) = self.cache.set(&order.order_number, ts).await {
                    warn!(order_number = %order.order_number, error = %err, "thread cache write failed");
                }
                ts.clone()
            }
            ThreadLookup::NotFound => {
                warn!(order_number = %order.order_number, "order thread not found");
                return WebhookOutcome::ThreadNotFound;
            }
        };

        match self.notifier.notify(&thread_ts).await {
            Ok(delivery) => {
                info!(
                    order_number = %order.order_number,
                    thread_ts = %thread_ts,
                    reacted = delivery.reacted,
                    "stock notification sent"
                );
                WebhookOutcome::Ok
            }
            Err(err) => {
                warn!(
                    order_number = %order.order_number,
                    thread_ts = %thread_ts,
                    error = %err,
                    code = err.code(),
                    "stock notification failed"
                );
                WebhookOutcome::NotifyFailed
            }
        }
    }

    // Only a delivered reply burns the key; everything else frees it for a retry.
    async fn settle(&self, key: &DedupKey, token: ClaimToken, outcome: WebhookOutcome) {
        let result = if outcome == WebhookOutcome::Ok {
            self.dedup.commit(key, token).await
        } else {
            self.dedup.release(key, token).await
        };
        if let Err(err) = result {
            error!(dedup_key = %key, outcome = outcome.label(), error = %err, "dedup store update failed");
        }
    }
}

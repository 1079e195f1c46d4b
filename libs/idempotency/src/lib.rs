//! Duplicate suppression for stock notifications.
//!
//! A notification opportunity is identified by a [`DedupKey`] (`order:status`). The
//! pipeline *claims* the key before touching Slack, *commits* it once the reply is
//! accepted and *releases* it on failure so a later delivery can try again. Claims are
//! atomic, so concurrent deliveries of the same pair cannot both notify.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Result;
use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// Composite key per order and normalized status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub order_number: String,
    pub status: String,
}

impl DedupKey {
    pub fn new(order_number: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            order_number: order_number.into(),
            status: status.into(),
        }
    }
}

impl Display for DedupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.order_number, self.status)
    }
}

/// Proof of ownership for a pending claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimToken(pub u64);

/// Result of trying to claim a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller owns the key and must commit or release it with the token.
    Acquired(ClaimToken),
    /// A notification for this key already succeeded.
    Duplicate,
    /// Another delivery holds the key right now.
    InFlight,
}

/// Contract implemented by dedup stores.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Marks `key` pending for `pending_ttl_s` unless it is already pending or committed.
    async fn claim(&self, key: &str, pending_ttl_s: u64) -> Result<Claim>;
    /// Records a delivered notification for `ttl_s`.
    ///
    /// Always commits, even when `token` no longer owns the key: the reply went out, so
    /// whoever holds the key now must see it as a duplicate.
    async fn commit(&self, key: &str, token: ClaimToken, ttl_s: u64) -> Result<()>;
    /// Drops the pending claim owned by `token`. Claims taken over by another
    /// delivery and committed entries are left alone.
    async fn release(&self, key: &str, token: ClaimToken) -> Result<()>;
}

/// Shared trait object wrapper.
pub type SharedDedupStore = Arc<dyn DedupStore>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Pending,
    Committed,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: EntryState,
    token: ClaimToken,
    expires: OffsetDateTime,
}

/// In-memory store; check-and-mark happens under one write lock.
#[derive(Clone, Default)]
pub struct InMemoryDedupStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    next_token: Arc<AtomicU64>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn purge_expired(&self, now: OffsetDateTime) {
        let mut guard = self.inner.write().await;
        guard.retain(|_, entry| entry.expires > now);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether a committed, unexpired entry exists for `key`.
    pub async fn is_committed(&self, key: &str) -> bool {
        let now = OffsetDateTime::now_utc();
        self.inner
            .read()
            .await
            .get(key)
            .is_some_and(|entry| entry.state == EntryState::Committed && entry.expires > now)
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn claim(&self, key: &str, pending_ttl_s: u64) -> Result<Claim> {
        let now = OffsetDateTime::now_utc();
        let mut guard = self.inner.write().await;
        guard.retain(|_, entry| entry.expires > now);
        match guard.get(key) {
            Some(entry) if entry.state == EntryState::Committed => Ok(Claim::Duplicate),
            Some(_) => Ok(Claim::InFlight),
            None => {
                let token = ClaimToken(self.next_token.fetch_add(1, Ordering::Relaxed));
                guard.insert(
                    key.to_string(),
                    Entry {
                        state: EntryState::Pending,
                        token,
                        expires: now + seconds(pending_ttl_s),
                    },
                );
                Ok(Claim::Acquired(token))
            }
        }
    }

    async fn commit(&self, key: &str, token: ClaimToken, ttl_s: u64) -> Result<()> {
        let expires = OffsetDateTime::now_utc() + seconds(ttl_s);
        self.inner.write().await.insert(
            key.to_string(),
            Entry {
                state: EntryState::Committed,
                token,
                expires,
            },
        );
        Ok(())
    }

    async fn release(&self, key: &str, token: ClaimToken) -> Result<()> {
        let mut guard = self.inner.write().await;
        let owned = guard
            .get(key)
            .is_some_and(|entry| entry.state == EntryState::Pending && entry.token == token);
        if owned {
            guard.remove(key);
        }
        Ok(())
    }
}

// Ten years; keeps `OffsetDateTime` arithmetic in range for absurd configs.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

fn seconds(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_TTL_SECS) as i64)
}

/// Configuration derived at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupConfig {
    pub ttl_hours: u64,
    pub pending_ttl_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 36,
            pending_ttl_secs: 300,
        }
    }
}

impl DedupConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads `DEDUP_TTL_HOURS` and `DEDUP_PENDING_TTL_SECS`; unparsable values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(parsed) = lookup("DEDUP_TTL_HOURS").and_then(|v| v.trim().parse::<u64>().ok()) {
            cfg.ttl_hours = parsed.max(1);
        }
        if let Some(parsed) =
            lookup("DEDUP_PENDING_TTL_SECS").and_then(|v| v.trim().parse::<u64>().ok())
        {
            cfg.pending_ttl_secs = parsed.max(1);
        }
        cfg
    }
}

/// Guard used by the webhook pipeline to gate notifications.
#[derive(Clone)]
pub struct DedupGuard {
    ttl_secs: u64,
    pending_ttl_secs: u64,
    store: SharedDedupStore,
}

impl DedupGuard {
    pub fn new(store: SharedDedupStore, config: &DedupConfig) -> Self {
        Self {
            store,
            ttl_secs: config.ttl_hours.saturating_mul(3600).max(60),
            pending_ttl_secs: config.pending_ttl_secs.max(1),
        }
    }

    /// Atomically checks and marks `key`. Only [`Claim::Acquired`] lets the caller proceed.
    #[instrument(name = "dedup.claim", skip(self), fields(key = %key))]
    pub async fn claim(&self, key: &DedupKey) -> Result<Claim> {
        let claim = self
            .store
            .claim(&key.to_string(), self.pending_ttl_secs)
            .await?;
        if !matches!(claim, Claim::Acquired(_)) {
            info!(order_number = %key.order_number, status = %key.status, ?claim, "duplicate notification suppressed");
            metrics::counter!("dedup_hit_total").increment(1);
        }
        Ok(claim)
    }

    pub async fn commit(&self, key: &DedupKey, token: ClaimToken) -> Result<()> {
        self.store.commit(&key.to_string(), token, self.ttl_secs).await
    }

    pub async fn release(&self, key: &DedupKey, token: ClaimToken) -> Result<()> {
        self.store.release(&key.to_string(), token).await
    }
}

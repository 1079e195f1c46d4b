//! Maps order numbers to the Slack thread announcing the order.
//!
//! Order threads are rooted at a message containing `ST.order #<digits>`. The cache is
//! consulted first; on a miss the most recent channel history page is scanned.
use once_cell::sync::Lazy;
use osn_session::SharedThreadCache;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::interfaces::SharedChatApi;
use crate::types::ChatMessage;

/// Number of history messages fetched per lookup. Older threads are not reachable.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

static ORDER_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bST\.order\s+#(\d+)\b").expect("valid order marker regex"));

/// Returns `true` when the first marker in `text` names exactly `order_number`.
/// Later markers refer to other orders and never match.
///
/// ```
/// use osn_core::thread::mentions_order;
///
/// assert!(mentions_order("New ST.order #1001 from web", "1001"));
/// assert!(!mentions_order("New ST.order #10011", "1001"));
/// assert!(!mentions_order("ST.order #7 split, see ST.order #1001", "1001"));
/// ```
pub fn mentions_order(text: &str, order_number: &str) -> bool {
    ORDER_MARKER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .is_some_and(|digits| digits.as_str() == order_number)
}

/// Scans messages in the given order and returns the `ts` of the first match.
pub fn find_thread_ts(messages: &[ChatMessage], order_number: &str) -> Option<String> {
    messages.iter().find_map(|message| {
        let text = message.text.as_deref()?;
        if mentions_order(text, order_number) {
            message.ts.clone()
        } else {
            None
        }
    })
}

/// Where a thread id came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadLookup {
    Cached(String),
    Found(String),
    NotFound,
}

impl ThreadLookup {
    pub fn thread_ts(&self) -> Option<&str> {
        match self {
            ThreadLookup::Cached(ts) | ThreadLookup::Found(ts) => Some(ts),
            ThreadLookup::NotFound => None,
        }
    }
}

/// Cache-first thread lookup. Never writes the cache itself.
#[derive(Clone)]
pub struct ThreadResolver {
    chat: SharedChatApi,
    cache: SharedThreadCache,
    channel: String,
    history_limit: u32,
}

impl ThreadResolver {
    pub fn new(
        chat: SharedChatApi,
        cache: SharedThreadCache,
        channel: impl Into<String>,
        history_limit: u32,
    ) -> Self {
        Self {
            chat,
            cache,
            channel: channel.into(),
            history_limit: history_limit.max(1),
        }
    }

    pub async fn resolve(&self, order_number: &str) -> ThreadLookup {
        match self.cache.get(order_number).await {
            Ok(Some(ts)) => {
                debug!(order_number, thread_ts = %ts, "thread cache hit");
                metrics::counter!("thread_cache_hit_total").increment(1);
                return ThreadLookup::Cached(ts);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(order_number, error = %err, "thread cache read failed; searching history");
            }
        }

        let messages = match self
            .chat
            .recent_messages(&self.channel, self.history_limit)
            .await
        {
            Ok(messages) => messages,
            Err(err) => {
                warn!(
                    order_number,
                    channel = %self.channel,
                    error = %err,
                    code = err.code(),
                    "channel history fetch failed"
                );
                return ThreadLookup::NotFound;
            }
        };

        match find_thread_ts(&messages, order_number) {
            Some(ts) => {
                info!(order_number, thread_ts = %ts, scanned = messages.len(), "order thread found");
                ThreadLookup::Found(ts)
            }
            None => {
                info!(order_number, scanned = messages.len(), "no order thread in recent history");
                ThreadLookup::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult, Upstream};
    use crate::interfaces::ChatApi;
    use crate::types::ApiReply;
    use async_trait::async_trait;
    use osn_session::{MemoryThreadCache, ThreadCache};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    struct HistoryOnly {
        messages: Option<Vec<ChatMessage>>,
        history_calls: AtomicUsize,
    }

    impl HistoryOnly {
        fn new(messages: Option<Vec<ChatMessage>>) -> Arc<Self> {
            Arc::new(Self {
                messages,
                history_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatApi for HistoryOnly {
        async fn recent_messages(&self, _channel: &str, limit: u32) -> ApiResult<Vec<ChatMessage>> {
            assert_eq!(limit, DEFAULT_HISTORY_LIMIT);
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            self.messages.clone().ok_or(ApiError::Rejected {
                upstream: Upstream::Slack,
                error: "not_in_channel".into(),
            })
        }

        async fn add_reaction(&self, _: &str, _: &str, _: &str) -> ApiResult<ApiReply> {
            unreachable!("resolver never writes")
        }

        async fn post_thread_reply(&self, _: &str, _: &str, _: &str) -> ApiResult<ApiReply> {
            unreachable!("resolver never writes")
        }
    }

    fn resolver(chat: Arc<HistoryOnly>, cache: Arc<MemoryThreadCache>) -> ThreadResolver {
        ThreadResolver::new(chat, cache, "C0A02M2VCTB", DEFAULT_HISTORY_LIMIT)
    }

    #[test]
    fn order_number_match_is_exact() {
        assert!(mentions_order("ST.order #123", "123"));
        assert!(mentions_order("ST.order\t#123 shipped", "123"));
        assert!(!mentions_order("ST.order #1234", "123"));
        assert!(!mentions_order("ST.order #0123", "123"));
        assert!(!mentions_order("ST.order #123", "0123"));
        assert!(!mentions_order("ST.order#123", "123"));
        assert!(!mentions_order("XST.order #123", "123"));
        assert!(!mentions_order("order #123", "123"));
    }

    #[test]
    fn only_the_first_marker_counts() {
        assert!(mentions_order("ST.order #1 replaces ST.order #2", "1"));
        assert!(!mentions_order("ST.order #1 replaces ST.order #2", "2"));
    }

    #[test]
    fn cross_reference_does_not_steal_the_thread() {
        let messages = vec![
            ChatMessage::new("3.0", "ST.order #1 split, see ST.order #2"),
            ChatMessage::new("2.0", "ST.order #2 created"),
        ];
        assert_eq!(find_thread_ts(&messages, "2").as_deref(), Some("2.0"));
        assert_eq!(find_thread_ts(&messages, "1").as_deref(), Some("3.0"));
    }

    #[test]
    fn first_matching_message_wins() {
        let messages = vec![
            ChatMessage::new("3.0", "unrelated chatter"),
            ChatMessage::new("2.0", "ST.order #1001 updated"),
            ChatMessage::new("1.0", "ST.order #1001 created"),
        ];
        assert_eq!(find_thread_ts(&messages, "1001").as_deref(), Some("2.0"));
        assert_eq!(find_thread_ts(&messages, "1002"), None);
    }

    #[test]
    fn messages_without_ts_are_skipped() {
        let messages = vec![
            ChatMessage {
                ts: None,
                text: Some("ST.order #5".into()),
                thread_ts: None,
            },
            ChatMessage::new("9.9", "ST.order #5"),
        ];
        assert_eq!(find_thread_ts(&messages, "5").as_deref(), Some("9.9"));
    }

    #[tokio::test]
    async fn cache_hit_skips_history_search() {
        let chat = HistoryOnly::new(Some(vec![ChatMessage::new("1.0", "ST.order #1001")]));
        let cache = Arc::new(MemoryThreadCache::new());
        cache.set("1001", "cached.ts").await.unwrap();

        let lookup = resolver(chat.clone(), cache).resolve("1001").await;
        assert_eq!(lookup, ThreadLookup::Cached("cached.ts".into()));
        assert_eq!(chat.history_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn miss_searches_history_without_writing_cache() {
        let chat = HistoryOnly::new(Some(vec![ChatMessage::new("1.0", "ST.order #1001")]));
        let cache = Arc::new(MemoryThreadCache::new());

        let lookup = resolver(chat.clone(), cache.clone()).resolve("1001").await;
        assert_eq!(lookup, ThreadLookup::Found("1.0".into()));
        assert_eq!(lookup.thread_ts(), Some("1.0"));
        assert_eq!(chat.history_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("1001").await.unwrap(), None);
    }

    #[tokio::test]
    async fn history_failure_is_not_found() {
        let chat = HistoryOnly::new(None);
        let lookup = resolver(chat, Arc::new(MemoryThreadCache::new()))
            .resolve("1001")
            .await;
        assert_eq!(lookup, ThreadLookup::NotFound);
        assert_eq!(lookup.thread_ts(), None);
    }
}

use tracing::{info, warn};

use crate::error::{ApiError, ApiResult, Upstream};
use crate::interfaces::SharedChatApi;
use crate::types::ApiReply;

pub const DEFAULT_REACTION: &str = "package";
pub const DEFAULT_REPLY_TEXT: &str = "📦 Stock available";

/// What gets posted into an order thread.
#[derive(Debug, Clone)]
pub struct NotifyOptions {
    pub channel: String,
    /// Emoji added to the thread root before replying; `None` disables the reaction.
    pub reaction: Option<String>,
    pub reply_text: String,
}

impl NotifyOptions {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            reaction: Some(DEFAULT_REACTION.into()),
            reply_text: DEFAULT_REPLY_TEXT.into(),
        }
    }
}

/// A reply that Slack accepted.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub reacted: bool,
    pub reply: ApiReply,
}

/// Posts the stock notification into a resolved thread.
#[derive(Clone)]
pub struct Notifier {
    chat: SharedChatApi,
    options: NotifyOptions,
}

impl Notifier {
    pub fn new(chat: SharedChatApi, options: NotifyOptions) -> Self {
        Self { chat, options }
    }

    pub fn options(&self) -> &NotifyOptions {
        &self.options
    }

    /// Reacts (best effort) then replies. `Ok` only when the reply has a 2xx status
    /// and `ok: true`.
    pub async fn notify(&self, thread_ts: &str) -> ApiResult<Delivery> {
        let reacted = match self.options.reaction.as_deref() {
            Some(name) => self.react(thread_ts, name).await,
            None => false,
        };

        let reply = self
            .chat
            .post_thread_reply(&self.options.channel, thread_ts, &self.options.reply_text)
            .await?;
        if !reply.is_success() {
            return Err(reply_failure(&reply));
        }
        info!(thread_ts, reacted, "thread reply posted");
        Ok(Delivery { reacted, reply })
    }

    async fn react(&self, thread_ts: &str, name: &str) -> bool {
        match self
            .chat
            .add_reaction(&self.options.channel, thread_ts, name)
            .await
        {
            Ok(reply) if reply.is_success() => {
                info!(thread_ts, reaction = name, "reaction added");
                true
            }
            Ok(reply) => {
                warn!(
                    thread_ts,
                    reaction = name,
                    status = reply.status,
                    error = reply.error().unwrap_or("unknown"),
                    "reaction add failed"
                );
                false
            }
            Err(err) => {
                warn!(thread_ts, reaction = name, error = %err, "reaction add failed");
                false
            }
        }
    }
}

fn reply_failure(reply: &ApiReply) -> ApiError {
    if (200..300).contains(&reply.status) {
        ApiError::Rejected {
            upstream: Upstream::Slack,
            error: reply.error().unwrap_or("unknown").to_string(),
        }
    } else {
        ApiError::Status {
            upstream: Upstream::Slack,
            status: reply.status,
            body: reply.raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::ChatApi;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        reaction: Option<ApiReply>,
        reply: Option<ApiReply>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatApi for Recorder {
        async fn recent_messages(&self, _: &str, _: u32) -> ApiResult<Vec<ChatMessage>> {
            unreachable!("notifier never reads history")
        }

        async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> ApiResult<ApiReply> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("react:{channel}:{ts}:{name}"));
            Ok(self
                .reaction
                .clone()
                .unwrap_or_else(|| ApiReply::from_body(200, json!({"ok": true}))))
        }

        async fn post_thread_reply(
            &self,
            channel: &str,
            thread_ts: &str,
            text: &str,
        ) -> ApiResult<ApiReply> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("reply:{channel}:{thread_ts}:{text}"));
            Ok(self
                .reply
                .clone()
                .unwrap_or_else(|| ApiReply::from_body(200, json!({"ok": true, "ts": "2.0"}))))
        }
    }

    #[tokio::test]
    async fn reacts_then_replies() {
        let chat = Arc::new(Recorder::default());
        let notifier = Notifier::new(chat.clone(), NotifyOptions::new("C1"));
        let delivery = notifier.notify("1.0").await.unwrap();
        assert!(delivery.reacted);
        assert_eq!(
            *chat.calls.lock().unwrap(),
            vec![
                "react:C1:1.0:package".to_string(),
                "reply:C1:1.0:📦 Stock available".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn reaction_can_be_disabled() {
        let chat = Arc::new(Recorder::default());
        let mut options = NotifyOptions::new("C1");
        options.reaction = None;
        let delivery = Notifier::new(chat.clone(), options).notify("1.0").await.unwrap();
        assert!(!delivery.reacted);
        assert_eq!(chat.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reaction_failure_does_not_block_reply() {
        let chat = Arc::new(Recorder {
            reaction: Some(ApiReply::from_body(
                200,
                json!({"ok": false, "error": "already_reacted"}),
            )),
            ..Default::default()
        });
        let delivery = Notifier::new(chat.clone(), NotifyOptions::new("C1"))
            .notify("1.0")
            .await
            .unwrap();
        assert!(!delivery.reacted);
        assert_eq!(chat.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn embedded_failure_flag_fails_the_reply() {
        let chat = Arc::new(Recorder {
            reply: Some(ApiReply::from_body(
                200,
                json!({"ok": false, "error": "thread_not_found"}),
            )),
            ..Default::default()
        });
        let err = Notifier::new(chat, NotifyOptions::new("C1"))
            .notify("1.0")
            .await
            .expect_err("ok=false must fail");
        assert_eq!(
            err.to_string(),
            "slack rejected the request: thread_not_found"
        );
    }

    #[tokio::test]
    async fn http_error_status_fails_the_reply() {
        let chat = Arc::new(Recorder {
            reply: Some(ApiReply::from_body(503, json!({"ok": true}))),
            ..Default::default()
        });
        let err = Notifier::new(chat, NotifyOptions::new("C1"))
            .notify("1.0")
            .await
            .expect_err("503 must fail");
        assert_eq!(err.code(), "status");
    }
}

use std::net::SocketAddr;
use std::time::Duration;

use osn_core::notify::{DEFAULT_REACTION, DEFAULT_REPLY_TEXT};
use osn_core::platforms::shopify::{DEFAULT_SHOPIFY_API_VERSION, default_api_base};
use osn_core::{DEFAULT_HISTORY_LIMIT, NotifyOptions};
use osn_idempotency::DedupConfig;
use thiserror::Error;

/// `#order` channel the order threads live in.
pub const DEFAULT_CHANNEL_ID: &str = "C0A02M2VCTB";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
/// Sequential Slack calls made while a dedup claim is held: history, reaction, reply.
pub const CALLS_UNDER_CLAIM: u64 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Clone)]
pub struct WebhookConfig {
    pub addr: SocketAddr,
    pub shop: String,
    pub shopify_token: String,
    pub shopify_api_base: String,
    pub shopify_api_version: String,
    pub slack_token: String,
    pub slack_api_base: Option<String>,
    pub channel_id: String,
    pub history_limit: u32,
    pub reaction_enabled: bool,
    pub reaction_name: String,
    pub reply_text: String,
    pub dedup: DedupConfig,
    pub http_timeout: Duration,
}

// Tokens stay out of logs.
impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("addr", &self.addr)
            .field("shop", &self.shop)
            .field("shopify_token", &"<redacted>")
            .field("shopify_api_base", &self.shopify_api_base)
            .field("shopify_api_version", &self.shopify_api_version)
            .field("slack_token", &"<redacted>")
            .field("slack_api_base", &self.slack_api_base)
            .field("channel_id", &self.channel_id)
            .field("history_limit", &self.history_limit)
            .field("reaction_enabled", &self.reaction_enabled)
            .field("reaction_name", &self.reaction_name)
            .field("reply_text", &self.reply_text)
            .field("dedup", &self.dedup)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl WebhookConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let shop = required("SHOPIFY_SHOP")?;
        let shopify_token = required("SHOPIFY_ACCESS_TOKEN")?;
        let slack_token = required("SLACK_BOT_TOKEN")?;

        let addr = parse_with("BIND", get("BIND"), DEFAULT_BIND.parse().ok(), |raw| {
            raw.parse::<SocketAddr>().map_err(|err| err.to_string())
        })?;
        let history_limit = parse_with(
            "HISTORY_LIMIT",
            get("HISTORY_LIMIT"),
            Some(DEFAULT_HISTORY_LIMIT),
            |raw| match raw.parse::<u32>() {
                Ok(0) => Err("must be at least 1".into()),
                Ok(limit) => Ok(limit),
                Err(err) => Err(err.to_string()),
            },
        )?;
        let reaction_enabled = parse_with(
            "NOTIFY_REACTION_ENABLED",
            get("NOTIFY_REACTION_ENABLED"),
            Some(true),
            parse_flag,
        )?;
        let http_timeout_secs = parse_with(
            "HTTP_TIMEOUT_SECS",
            get("HTTP_TIMEOUT_SECS"),
            Some(DEFAULT_HTTP_TIMEOUT_SECS),
            |raw| raw.parse::<u64>().map_err(|err| err.to_string()),
        )?;

        let http_timeout_secs = http_timeout_secs.max(1);
        let dedup = DedupConfig::from_lookup(&lookup);
        // A claim must outlive the slowest delivery, or a stale owner can race a new one.
        let worst_case = http_timeout_secs.saturating_mul(CALLS_UNDER_CLAIM);
        if worst_case >= dedup.pending_ttl_secs {
            return Err(ConfigError::Invalid {
                var: "DEDUP_PENDING_TTL_SECS",
                value: dedup.pending_ttl_secs.to_string(),
                reason: format!(
                    "must exceed {CALLS_UNDER_CLAIM} x HTTP_TIMEOUT_SECS ({worst_case}s)"
                ),
            });
        }

        Ok(Self {
            addr,
            shopify_api_base: get("SHOPIFY_API_BASE").unwrap_or_else(|| default_api_base(&shop)),
            shopify_api_version: get("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_SHOPIFY_API_VERSION.into()),
            shop,
            shopify_token,
            slack_token,
            slack_api_base: get("SLACK_API_BASE"),
            channel_id: get("SLACK_CHANNEL_ID").unwrap_or_else(|| DEFAULT_CHANNEL_ID.into()),
            history_limit,
            reaction_enabled,
            reaction_name: get("NOTIFY_REACTION_NAME").unwrap_or_else(|| DEFAULT_REACTION.into()),
            reply_text: get("NOTIFY_REPLY_TEXT").unwrap_or_else(|| DEFAULT_REPLY_TEXT.into()),
            dedup,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    pub fn notify_options(&self) -> NotifyOptions {
        NotifyOptions {
            channel: self.channel_id.clone(),
            reaction: self
                .reaction_enabled
                .then(|| self.reaction_name.clone()),
            reply_text: self.reply_text.clone(),
        }
    }
}

fn parse_with<T, P>(
    var: &'static str,
    raw: Option<String>,
    default: Option<T>,
    parse: P,
) -> Result<T, ConfigError>
where
    P: Fn(&str) -> Result<T, String>,
{
    match raw {
        Some(value) => parse(&value).map_err(|reason| ConfigError::Invalid {
            var,
            value,
            reason,
        }),
        None => default.ok_or(ConfigError::Missing(var)),
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected a boolean".into()),
    }
}

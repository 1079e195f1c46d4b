use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound Shopify `orders/updated` webhook body.
///
/// Only the fields the notifier needs are decoded; everything else is ignored.
///
/// ```
/// use osn_core::OrderUpdate;
///
/// let update: OrderUpdate = serde_json::from_str(r##"{"name":"#1001","id":999}"##).unwrap();
/// let order = update.order_ref().unwrap();
/// assert_eq!(order.order_number, "1001");
/// assert_eq!(order.order_id, "999");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct OrderUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl OrderUpdate {
    /// Extracts the order reference, or `None` when `name` is missing or blank.
    ///
    /// A missing `id` yields an empty `order_id`; callers decide what to do with it.
    pub fn order_ref(&self) -> Option<OrderRef> {
        let order_number = self
            .name
            .as_deref()
            .map(|name| name.trim().trim_start_matches('#').trim())
            .filter(|number| !number.is_empty())?
            .to_string();
        let order_id = match &self.id {
            Some(Value::String(id)) => id.trim().to_string(),
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        };
        Some(OrderRef {
            order_number,
            order_id,
        })
    }
}

/// Order identity extracted once per webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderRef {
    /// Human-facing order number (`name` without the `#`).
    pub order_number: String,
    /// Shopify order id used for Admin API lookups.
    pub order_id: String,
}

/// A namespaced key/value attribute attached to a Shopify order.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Metafield {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Metafield {
    pub fn new(namespace: &str, key: &str, value: impl Into<Value>) -> Self {
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            value: Some(value.into()),
        }
    }

    /// Value rendered as text; null counts as absent, non-strings use their JSON form.
    pub fn text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// One entry of Slack channel history.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

impl ChatMessage {
    pub fn new(ts: &str, text: &str) -> Self {
        Self {
            ts: Some(ts.to_string()),
            text: Some(text.to_string()),
            thread_ts: None,
        }
    }
}

/// Result of a write call against the chat API.
///
/// A 2xx transport status alone is not success: Slack reports business failures with
/// HTTP 200 and `"ok": false`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub ok: bool,
    pub raw: Value,
}

impl ApiReply {
    pub fn from_body(status: u16, raw: Value) -> Self {
        let ok = raw.get("ok").and_then(Value::as_bool).unwrap_or(false);
        Self { status, ok, raw }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.ok
    }

    /// Slack's `error` field, when present.
    pub fn error(&self) -> Option<&str> {
        self.raw.get("error").and_then(Value::as_str)
    }
}

//! Order stock notifier core: upstream API clients and the three resolution steps.
//!
//! The webhook app wires these together: [`StockResolver`] decides whether an order is
//! ready, [`ThreadResolver`] finds the Slack thread announcing the order, and
//! [`Notifier`] posts into it. Upstream access goes through the [`CommerceApi`] and
//! [`ChatApi`] traits so tests can substitute their own doubles.
pub mod error;
pub mod http;
pub mod interfaces;
pub mod notify;
pub mod platforms;
pub mod stock;
pub mod thread;
pub mod types;

pub use error::*;
pub use interfaces::*;
pub use notify::*;
pub use platforms::*;
pub use stock::*;
pub use thread::{DEFAULT_HISTORY_LIMIT, ThreadLookup, ThreadResolver, find_thread_ts};
pub use types::*;

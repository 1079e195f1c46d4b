pub mod client;

pub use client::{DEFAULT_SLACK_API_BASE, SlackClient};

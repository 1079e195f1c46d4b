//! Concrete clients for the upstream platforms.
pub mod shopify;
pub mod slack;

pub use shopify::ShopifyClient;
pub use slack::SlackClient;

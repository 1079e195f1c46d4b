pub mod client;

pub use client::{DEFAULT_SHOPIFY_API_VERSION, ShopifyClient, default_api_base};

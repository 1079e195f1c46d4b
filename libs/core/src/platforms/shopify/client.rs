use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult, Upstream};
use crate::http::{join_url, truncate_body};
use crate::interfaces::CommerceApi;
use crate::types::Metafield;

pub const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-01";

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Admin API origin for a shop handle, e.g. `acme` → `https://acme.myshopify.com`.
pub fn default_api_base(shop: &str) -> String {
    format!("https://{shop}.myshopify.com")
}

/// Shopify Admin REST client scoped to a single shop.
#[derive(Clone)]
pub struct ShopifyClient {
    http: reqwest::Client,
    access_token: String,
    api_base: String,
    api_version: String,
}

#[derive(Debug, Deserialize)]
struct MetafieldsResponse {
    #[serde(default)]
    metafields: Vec<Metafield>,
}

impl ShopifyClient {
    pub fn new(
        http: reqwest::Client,
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        api_version: Option<String>,
    ) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            api_base: api_base.into(),
            api_version: api_version.unwrap_or_else(|| DEFAULT_SHOPIFY_API_VERSION.into()),
        }
    }

    fn metafields_url(&self, order_id: &str) -> String {
        join_url(
            &self.api_base,
            &format!(
                "admin/api/{}/orders/{}/metafields.json",
                self.api_version, order_id
            ),
        )
    }

    fn net(err: reqwest::Error) -> ApiError {
        ApiError::Transport {
            upstream: Upstream::Shopify,
            source: err,
        }
    }
}

#[async_trait]
impl CommerceApi for ShopifyClient {
    async fn order_metafields(&self, order_id: &str) -> ApiResult<Vec<Metafield>> {
        let url = self.metafields_url(order_id);
        debug!(%url, "fetching order metafields");
        let response = self
            .http
            .get(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await
            .map_err(Self::net)?;

        let status = response.status();
        let body_text = response.text().await.map_err(Self::net)?;
        if !status.is_success() {
            return Err(ApiError::Status {
                upstream: Upstream::Shopify,
                status: status.as_u16(),
                body: truncate_body(&body_text),
            });
        }

        let parsed: MetafieldsResponse =
            serde_json::from_str(&body_text).map_err(|source| ApiError::Decode {
                upstream: Upstream::Shopify,
                source,
            })?;
        Ok(parsed.metafields)
    }
}

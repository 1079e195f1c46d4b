//! Stock-status evaluation for order metafields.
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::interfaces::SharedCommerceApi;
use crate::types::Metafield;

pub const STOCK_NAMESPACE: &str = "custom";
pub const STOCK_KEY: &str = "stock_status";
/// Normalized value that triggers a notification.
pub const STOCK_AVAILABLE: &str = "stock_available";

/// Trims, lowercases and turns spaces into underscores.
///
/// ```
/// use osn_core::normalize_status;
///
/// assert_eq!(normalize_status("  Stock Available "), "stock_available");
/// assert_eq!(normalize_status(&normalize_status("Out of Stock")), "out_of_stock");
/// ```
pub fn normalize_status(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// First `custom.stock_status` metafield value, if any.
pub fn find_stock_status(metafields: &[Metafield]) -> Option<String> {
    metafields
        .iter()
        .find(|field| field.namespace == STOCK_NAMESPACE && field.key == STOCK_KEY)
        .and_then(Metafield::text)
}

/// Outcome of resolving an order's stock status.
#[derive(Debug)]
pub enum StockLookup {
    /// The status normalizes to [`STOCK_AVAILABLE`]; carries the normalized value.
    Available(String),
    /// Absent or any other value.
    NotAvailable(Option<String>),
    /// The commerce API could not be read.
    FetchFailed(ApiError),
}

impl StockLookup {
    pub fn from_metafields(metafields: &[Metafield]) -> Self {
        match find_stock_status(metafields).map(|raw| normalize_status(&raw)) {
            Some(normalized) if normalized == STOCK_AVAILABLE => StockLookup::Available(normalized),
            other => StockLookup::NotAvailable(other),
        }
    }
}

/// Reads order metafields and evaluates the stock status.
#[derive(Clone)]
pub struct StockResolver {
    commerce: SharedCommerceApi,
}

impl StockResolver {
    pub fn new(commerce: SharedCommerceApi) -> Self {
        Self { commerce }
    }

    pub async fn resolve(&self, order_id: &str) -> StockLookup {
        let metafields = match self.commerce.order_metafields(order_id).await {
            Ok(fields) => fields,
            Err(err) => {
                warn!(order_id, error = %err, code = err.code(), "failed to fetch metafields");
                return StockLookup::FetchFailed(err);
            }
        };
        debug!(order_id, count = metafields.len(), "metafields fetched");
        let lookup = StockLookup::from_metafields(&metafields);
        match &lookup {
            StockLookup::Available(value) | StockLookup::NotAvailable(Some(value)) => {
                debug!(order_id, normalized = %value, "stock status evaluated");
            }
            StockLookup::NotAvailable(None) => {
                debug!(order_id, "stock status metafield absent");
            }
            StockLookup::FetchFailed(_) => {}
        }
        lookup
    }
}

//! Price monitoring (`GET /api/monitoring/prices?product_id=`)

use serde::{Deserialize, Serialize};

use crate::client::ServiceClient;
use crate::error::{Error, Result};

/// One observed price for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub time: String,
    pub price: f64,
    #[serde(default)]
    pub product_id: String,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    data: Option<Vec<PriceRecord>>,
}

/// Price history for `product_id`; empty when the service has none
pub async fn price_history(client: &ServiceClient, product_id: &str) -> Result<Vec<PriceRecord>> {
    let product_id = product_id.trim();
    if product_id.is_empty() {
        return Err(Error::Validation("Please enter a Product ID.".to_string()));
    }
    let response: HistoryResponse = client
        .get_json("/api/monitoring/prices", &[("product_id", product_id)], None)
        .await?;
    Ok(response.data.unwrap_or_default())
}

//! Health check (`GET /health`)

use reqwest::Method;
use tracing::debug;

use crate::client::ServiceClient;
use crate::error::{Error, Result};

/// Fetch the service's health document.
///
/// Any non-2xx status is reported with the generic status message; the body
/// of a failed response is not inspected.
pub async fn check_health(client: &ServiceClient) -> Result<serde_json::Value> {
    let response = client.request(Method::GET, "/health", None).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::http_status(status.as_u16()));
    }
    let body = response.text().await?;
    debug!(bytes = body.len(), "Health response");
    serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))
}

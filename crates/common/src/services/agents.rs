//! Image analysis through the AI agents service (`POST /api/agents/consume`)
//!
//! The endpoint is called without a bearer token.

use base64::Engine;
use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::ServiceClient;
use crate::config::{Service, ServiceEndpoints};
use crate::error::{Error, Result};

const TASK_TYPE: &str = "image_analysis";
const NO_MESSAGES_STATUS: &str = "No new messages to process";

#[derive(Debug, Serialize)]
struct ConsumeRequest<'a> {
    task_type: &'a str,
    task_id: &'a str,
    image_b64: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ConsumeResponse {
    #[serde(default)]
    results: Vec<TaskResult>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskResult {
    #[serde(default)]
    identified_product: Option<String>,
}

/// Outcome of a successful analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAnalysis {
    pub task_id: String,
    pub identified_product: String,
}

/// Send `image` for product identification
pub async fn analyze_image(endpoints: &ServiceEndpoints, image: &[u8]) -> Result<ImageAnalysis> {
    if image.is_empty() {
        return Err(Error::Validation("Please select an image to upload.".to_string()));
    }
    let client = ServiceClient::new(endpoints.require(Service::Agents)?);

    let task_id = format!("image-task-{}", Utc::now().timestamp_millis());
    let image_b64 = base64::engine::general_purpose::STANDARD.encode(image);
    debug!(%task_id, bytes = image.len(), "Submitting image");

    let response: Option<ConsumeResponse> = client
        .send_json(
            Method::POST,
            "/api/agents/consume",
            &ConsumeRequest {
                task_type: TASK_TYPE,
                task_id: &task_id,
                image_b64: &image_b64,
            },
            None,
        )
        .await?;
    let response = response.unwrap_or_default();

    let product = response
        .results
        .into_iter()
        .next()
        .and_then(|r| r.identified_product)
        .filter(|p| !p.is_empty());

    match product {
        Some(identified_product) => {
            info!(%task_id, %identified_product, "Product identified");
            Ok(ImageAnalysis {
                task_id,
                identified_product,
            })
        }
        None if response.status.as_deref() == Some(NO_MESSAGES_STATUS) => Err(Error::NoResult(
            "No new messages were processed. Ensure the Kafka producer is sending messages."
                .to_string(),
        )),
        None => Err(Error::NoResult(
            "Product identification failed or no product found.".to_string(),
        )),
    }
}

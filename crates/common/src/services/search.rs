//! Search (`GET /api/search?q=`)

use serde::{Deserialize, Serialize};

use crate::client::ServiceClient;
use crate::error::{Error, Result};
use crate::types::Credential;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    /// Collection the hit came from (users, products, stores, offers)
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SearchResult {
    /// Name, else email, else id
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

pub async fn search(client: &ServiceClient, credential: &Credential, query: &str) -> Result<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Err(Error::Validation("Please enter a search query.".to_string()));
    }
    let response: SearchResponse = client
        .get_json("/api/search", &[("q", query)], Some(credential))
        .await?;
    Ok(response.results)
}

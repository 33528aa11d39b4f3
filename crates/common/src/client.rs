//! HTTP client for the services under test

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Credential;

/// JSON client bound to one service base URL
#[derive(Clone, Debug)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Share a connection pool between clients
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request builder with the bearer header attached when a credential is given
    pub fn request(&self, method: Method, path: &str, credential: Option<&Credential>) -> reqwest::RequestBuilder {
        let url = self.url(path);
        debug!(%method, %url, authorized = credential.is_some(), "Request");
        let builder = self.http.request(method, url);
        match credential {
            Some(c) => builder.header(reqwest::header::AUTHORIZATION, c.bearer()),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        credential: Option<&Credential>,
    ) -> Result<T> {
        let response = self
            .request(Method::GET, path, credential)
            .query(query)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<T> {
        let response = self
            .request(method, path, credential)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// DELETE that only succeeds on `204 No Content`
    pub async fn delete(&self, path: &str, credential: Option<&Credential>) -> Result<()> {
        let response = self
            .request(Method::DELETE, path, credential)
            .send()
            .await?;
        let status = response.status().as_u16();
        debug!(status, "Response");
        if status == 204 {
            return Ok(());
        }
        let body = response.text().await?;
        Err(error_from_body(status, &body))
    }
}

/// Decode a JSON body, or turn a failed response into an [`Error::Http`]
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    debug!(status = status.as_u16(), "Response");
    let body = response.text().await?;
    if !status.is_success() {
        return Err(error_from_body(status.as_u16(), &body));
    }
    // Empty bodies decode as JSON null so `Value` callers accept them
    let text = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(text).map_err(|e| Error::Decode(e.to_string()))
}

/// Message from the body's `error` field, else the generic status message
pub fn error_from_body(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.as_str())
                .filter(|e| !e.is_empty())
                .map(str::to_string)
        });
    match message {
        Some(message) => Error::Http { status, message },
        None => Error::http_status(status),
    }
}

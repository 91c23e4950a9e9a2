//! HTTP API client
//!
//! One `reqwest::Client` configured from [`ClientConfig`], shared by every
//! resource module. The client issues exactly one request per call and
//! never retries; retry policy belongs to the caller (a manual refresh in
//! the UI), not to this layer.

pub mod medical_notes;

pub use medical_notes::MedicalNotesApi;

use crate::config::ClientConfig;
use crate::error::{ChairsideError, ChairsideResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Typed HTTP client for the practice backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// Validates the configuration, then constructs the underlying
    /// `reqwest::Client` with the configured timeouts and default headers.
    pub fn new(config: &ClientConfig) -> ChairsideResult<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.timeouts.connect_timeout())
            .timeout(config.timeouts.request_timeout());

        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(val)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, val);
            }
        }
        if !headers.is_empty() {
            builder = builder.default_headers(headers);
        }

        let http = builder
            .build()
            .map_err(|e| ChairsideError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The backend base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the JSON response body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ChairsideResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChairsideError::network(e.to_string()))?;
        Self::decode_response(path, response).await
    }

    /// POST `body` as JSON to `path` and decode the JSON response body
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ChairsideResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChairsideError::network(e.to_string()))?;
        Self::decode_response(path, response).await
    }

    /// Map the response per the backend contract: non-2xx is an opaque
    /// [`ChairsideError::Http`], a 2xx body that fails to parse is a
    /// [`ChairsideError::Decode`].
    async fn decode_response<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> ChairsideResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(ChairsideError::http(status.as_u16(), endpoint));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ChairsideError::decode(e.to_string()))
    }
}

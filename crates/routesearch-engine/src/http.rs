//! HTTP client for Elasticsearch-compatible REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::client::{ClientFactory, ConnectOptions, SearchClient};
use crate::error::TransportError;
use crate::types::{MultiSearchRequest, MultiSearchResponse, SearchRequest};

const NDJSON: &str = "application/x-ndjson";

/// Factory producing [`HttpSearchClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn SearchClient>, TransportError> {
        Ok(Box::new(HttpSearchClient::new(options)?))
    }
}

/// Search client speaking the `_search`/`_msearch` REST API.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpSearchClient {
    /// Create a client for the given host.
    ///
    /// A host without a scheme is treated as plain `http://`.
    pub fn new(options: &ConnectOptions) -> Result<Self, TransportError> {
        let host = options.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(TransportError::Connection(
                "connection string rendered empty".to_string(),
            ));
        }

        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &options.engine.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::Connection(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::Connection(format!("invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = options.engine.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let inner = builder
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        debug!(
            base_url = %base_url,
            api_version = %options.engine.api_version,
            "Created search client"
        );

        Ok(Self { inner, base_url })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self, request: &SearchRequest) -> String {
        match request.doc_type.as_deref() {
            Some(doc_type) if !doc_type.is_empty() => {
                format!("{}/{}/{}/_search", self.base_url, request.index, doc_type)
            }
            _ => format!("{}/{}/_search", self.base_url, request.index),
        }
    }

    /// Send a request and decode a successful JSON reply.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Value, TransportError> {
        let url = self.search_url(request);
        debug!(url = %url, "POST search");

        self.send(self.inner.post(&url).json(&request.body)).await
    }

    async fn multi_search(
        &self,
        request: &MultiSearchRequest,
    ) -> Result<MultiSearchResponse, TransportError> {
        let url = format!("{}/_msearch", self.base_url);
        debug!(url = %url, searches = request.len(), "POST multi-search");

        let mut body = String::new();
        for line in request.bulk_body() {
            body.push_str(&line.to_string());
            body.push('\n');
        }

        self.send(
            self.inner
                .post(&url)
                .header(CONTENT_TYPE, NDJSON)
                .body(body),
        )
        .await
    }
}

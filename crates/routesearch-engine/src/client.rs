//! Search client abstraction.
//!
//! The executor never talks to the network directly. It asks a
//! [`ClientFactory`] for a [`SearchClient`] bound to the rendered connection
//! string and issues at most one call on it per execution.

use async_trait::async_trait;
use routesearch_core::EngineOptions;
use serde_json::Value;

use crate::error::TransportError;
use crate::types::{MultiSearchRequest, MultiSearchResponse, SearchRequest};

/// Everything a factory needs to build a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    /// Rendered connection string.
    pub host: String,

    /// Options from the task configuration.
    pub engine: EngineOptions,
}

impl ConnectOptions {
    /// Combine a rendered host with the configured engine options.
    pub fn new(host: impl Into<String>, engine: EngineOptions) -> Self {
        Self {
            host: host.into(),
            engine,
        }
    }
}

/// A connection to a search engine.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run one search and return the raw response.
    async fn search(&self, request: &SearchRequest) -> Result<Value, TransportError>;

    /// Run a batch of searches in a single round trip.
    ///
    /// Responses must be returned in request order.
    async fn multi_search(
        &self,
        request: &MultiSearchRequest,
    ) -> Result<MultiSearchResponse, TransportError>;
}

/// Builds clients for rendered connection strings.
pub trait ClientFactory: Send + Sync {
    /// Create a client. Called once per task execution.
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn SearchClient>, TransportError>;
}

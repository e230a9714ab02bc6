//! Search task engine for routesearch
//!
//! This crate turns a [`RouteTask`](routesearch_core::RouteTask) and the
//! [`RouteMatch`](routesearch_core::RouteMatch) it was dispatched for into
//! executed searches with pagination attached, or into a single
//! [`TaskError`] the host router can act on.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use routesearch_core::{RouteMatch, RouteTask};
//! use routesearch_engine::{HelperRegistry, SearchTask, TemplateRenderer};
//!
//! async fn run(task_json: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let task = RouteTask::from_json(task_json)?;
//!     let renderer = Arc::new(TemplateRenderer::new(HelperRegistry::new()));
//!     let executor = SearchTask::http(renderer);
//!
//!     let route = RouteMatch::new(serde_json::json!({"params": {"q": "food"}}));
//!     match executor.execute(&route, &task).await {
//!         Ok(output) => println!("{}", serde_json::to_string(&output)?),
//!         Err(err) => println!("redirect to {:?} ({})", err.redirect_to, err.status_code),
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod executor;
mod http;
mod renderer;
mod types;

// Re-export main types
pub use client::{ClientFactory, ConnectOptions, SearchClient};
pub use error::{
    Cause, FailureStage, TaskError, TaskErrorReport, TemplateFailure, TransportError,
    STATUS_INTERNAL, STATUS_NOT_FOUND,
};
pub use executor::{RouterTask, SearchTask, TASK_NAME};
pub use http::{HttpClientFactory, HttpSearchClient};
pub use renderer::{CompiledTemplate, HelperRegistry, RendererOptions, TemplateRenderer};
pub use types::{
    total_hits, MultiSearchRequest, MultiSearchResponse, SearchRequest, SearchResult,
    SearchResultMap, TaskOutput,
};

//! routesearch Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Template rendering
//! - Runtime specifics
//!
//! It describes what a search task looks like (query templates, connection
//! options, the route context it runs against) and how results are paginated.

pub mod error;
pub mod pagination;
pub mod route;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use pagination::{compute_pagination, PageEntry, Pagination, PaginationDetails};
pub use route::RouteMatch;
pub use task::{EngineOptions, QuerySet, QueryTemplate, RouteTask, TaskConfig};

//! Search task configuration.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::CoreError;

/// Engine API version assumed when the configuration does not name one.
pub const DEFAULT_API_VERSION: &str = "5.6";

/// A declarative search query rendered against a route context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTemplate {
    /// Key of this template's result in a batch.
    #[serde(default)]
    pub name: String,

    /// Index to search.
    pub index: String,

    /// Document type, for engines that still have them.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    /// Template source that renders to the JSON query body.
    pub template: String,

    /// Route to redirect to when the query matches nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_results_route: Option<String>,
}

impl QueryTemplate {
    /// Create a template with no type and no no-results route.
    pub fn new(
        name: impl Into<String>,
        index: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index: index.into(),
            doc_type: None,
            template: template.into(),
            no_results_route: None,
        }
    }

    /// Builder method to set the document type.
    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Builder method to set the no-results redirect.
    pub fn with_no_results_route(mut self, route: impl Into<String>) -> Self {
        self.no_results_route = Some(route.into());
        self
    }
}

/// One query or a named batch of queries.
///
/// On the wire this is either a single template object or an array of them;
/// the shape is resolved here, once, when the configuration is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuerySet {
    /// Several named queries sent as one multi-search.
    Batch(Vec<QueryTemplate>),
    /// A single query.
    Single(QueryTemplate),
}

impl QuerySet {
    /// All templates, in execution order.
    pub fn templates(&self) -> &[QueryTemplate] {
        match self {
            Self::Batch(templates) => templates,
            Self::Single(template) => std::slice::from_ref(template),
        }
    }

    /// Returns true for a multi-search batch.
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }
}

/// Options passed to the search client alongside the rendered host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Engine API version.
    ///
    /// Kept for configuration compatibility and reported in logs. The REST
    /// client speaks the same `_search`/`_msearch` API for every version.
    pub api_version: String,

    /// Per-request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Extra headers sent with every request.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Client-specific options this crate does not interpret.
    ///
    /// Kept for configuration compatibility and handed to the client factory
    /// untouched, so a custom `ClientFactory` can read them. The bundled HTTP
    /// client ignores them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout_secs: None,
            headers: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

/// Configuration of a search task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    /// Template for the engine host, rendered against the route context.
    pub connection_string_template: String,

    /// Client options merged over the rendered host.
    #[serde(
        default,
        rename = "elasticsearchConfig",
        alias = "engineConnectionOptions"
    )]
    pub engine_options: EngineOptions,

    /// The query or queries to run.
    pub query_templates: QuerySet,
}

impl TaskConfig {
    /// Check the invariants execution relies on.
    ///
    /// Batch templates must have unique, non-empty names since results are
    /// looked up by name.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.connection_string_template.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "connectionStringTemplate is empty".to_string(),
            ));
        }

        if let QuerySet::Batch(templates) = &self.query_templates {
            if templates.is_empty() {
                return Err(CoreError::EmptyBatch);
            }

            let mut seen = HashSet::new();
            for (position, template) in templates.iter().enumerate() {
                if template.name.is_empty() {
                    return Err(CoreError::UnnamedTemplate(position));
                }
                if !seen.insert(template.name.as_str()) {
                    return Err(CoreError::DuplicateTemplateName(template.name.clone()));
                }
            }
        }

        Ok(())
    }
}

/// A task as configured on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTask {
    /// Task name, for logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Route to redirect to on technical failures.
    #[serde(default)]
    pub error_route: Option<String>,

    /// Search configuration.
    pub config: TaskConfig,
}

impl RouteTask {
    /// Create a task with no name and no error route.
    pub fn new(config: TaskConfig) -> Self {
        Self {
            name: None,
            error_route: None,
            config,
        }
    }

    /// Builder method to set the error route.
    pub fn with_error_route(mut self, route: impl Into<String>) -> Self {
        self.error_route = Some(route.into());
        self
    }

    /// Builder method to set the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse and validate a task from JSON.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let task: Self = serde_json::from_str(json)?;
        task.config.validate()?;
        Ok(task)
    }
}

//! Error types for search task execution.
//!
//! Every failure inside the pipeline is recorded as a [`Failure`] tagged with
//! the stage it happened in, then converted exactly once into the
//! [`TaskError`] envelope the host router sees.

use std::fmt;

use routesearch_core::{RouteMatch, RouteTask};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Status code for technical failures.
pub const STATUS_INTERNAL: u16 = 500;

/// Status code for the no-results business rule.
pub const STATUS_NOT_FOUND: u16 = 404;

/// Errors raised by a search client.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to build a client for the rendered connection string.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The engine answered with something that is not a search response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by the template renderer.
#[derive(Debug, Error)]
pub enum TemplateFailure {
    /// The template source is not valid for the dialect.
    #[error("template compile error: {0}")]
    Compile(#[from] handlebars::TemplateError),

    /// The template failed against the given context.
    #[error("template render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Underlying cause of a [`TaskError`].
#[derive(Debug, Error)]
pub enum Cause {
    #[error(transparent)]
    Template(#[from] TemplateFailure),

    #[error("rendered query is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// One entry of a multi-search reported its own error.
    #[error("engine rejected query: {0}")]
    Rejected(String),

    /// The query matched nothing and a no-results route is configured.
    #[error("No results")]
    NoResults { redirect_to: String },
}

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    ConnectionString,
    Connect,
    Compile,
    Render,
    Parse,
    Search,
    BatchEntry,
    NoResults,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConnectionString => "connection string",
            Self::Connect => "connect",
            Self::Compile => "template compile",
            Self::Render => "template render",
            Self::Parse => "query parse",
            Self::Search => "search",
            Self::BatchEntry => "batch entry",
            Self::NoResults => "no results",
        };
        f.write_str(name)
    }
}

/// Uniform error surfaced to the host router.
///
/// The router is expected to consult `status_code` and `redirect_to` to
/// decide between an error page and a redirect.
#[derive(Debug, Error)]
#[error("{stage} failed: {cause}")]
pub struct TaskError {
    /// Stage that failed.
    pub stage: FailureStage,

    /// What went wrong.
    #[source]
    pub cause: Cause,

    /// 404 for no-results, 500 for everything else.
    pub status_code: u16,

    /// The route context being processed.
    pub source_route: RouteMatch,

    /// The task configuration in force.
    pub task: RouteTask,

    /// Where the router should redirect, if anywhere.
    pub redirect_to: Option<String>,

    /// Stage-specific diagnostics (template, rendered text, payload, ...).
    pub data: Value,
}

impl TaskError {
    /// Returns true if this is the no-results business rule.
    pub fn is_no_results(&self) -> bool {
        matches!(self.cause, Cause::NoResults { .. })
    }

    /// Serializable envelope for the host router or for logging.
    pub fn report(&self) -> TaskErrorReport {
        TaskErrorReport {
            message: self.to_string(),
            stage: self.stage,
            status_code: self.status_code,
            redirect_to: self.redirect_to.clone(),
            source_route: self.source_route.clone(),
            task: self.task.clone(),
            data: self.data.clone(),
        }
    }
}

/// JSON shape of a [`TaskError`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskErrorReport {
    pub message: String,
    pub stage: FailureStage,
    pub status_code: u16,
    pub redirect_to: Option<String>,
    pub source_route: RouteMatch,
    pub task: RouteTask,
    pub data: Value,
}

/// A stage failure that has not been wrapped yet.
#[derive(Debug)]
pub(crate) struct Failure {
    pub(crate) stage: FailureStage,
    pub(crate) cause: Cause,
    pub(crate) data: Value,
}

impl Failure {
    pub(crate) fn new(stage: FailureStage, cause: impl Into<Cause>, data: Value) -> Self {
        Self {
            stage,
            cause: cause.into(),
            data,
        }
    }

    /// Wrap into the router-facing envelope.
    pub(crate) fn into_task_error(self, route: &RouteMatch, task: &RouteTask) -> TaskError {
        let (status_code, redirect_to) = match &self.cause {
            Cause::NoResults { redirect_to } => (STATUS_NOT_FOUND, Some(redirect_to.clone())),
            _ => (STATUS_INTERNAL, task.error_route.clone()),
        };

        if status_code == STATUS_NOT_FOUND {
            warn!(
                stage = %self.stage,
                redirect_to = ?redirect_to,
                "Search task produced no results"
            );
        } else {
            error!(
                stage = %self.stage,
                error = %self.cause,
                redirect_to = ?redirect_to,
                "Search task failed"
            );
        }

        TaskError {
            stage: self.stage,
            cause: self.cause,
            status_code,
            source_route: route.clone(),
            task: task.clone(),
            redirect_to,
            data: self.data,
        }
    }
}

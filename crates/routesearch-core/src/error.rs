//! Core domain errors.

use thiserror::Error;

/// Errors raised while loading or validating task configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two templates in one batch share a name.
    #[error("Duplicate query template name: {0}")]
    DuplicateTemplateName(String),

    /// A batch template has no name, so its result could not be looked up.
    #[error("Query template at position {0} has an empty name")]
    UnnamedTemplate(usize),

    /// A batch with no templates.
    #[error("Query template collection is empty")]
    EmptyBatch,

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

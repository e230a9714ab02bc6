//! Route match context handed over by the host router.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The runtime context of a matched route.
///
/// Its contents are owned by the host router (path params, query string,
/// route metadata, ...). Templates render against it and errors echo it back;
/// nothing here interprets its fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteMatch(Value);

impl RouteMatch {
    /// Wrap a JSON context.
    pub fn new(context: Value) -> Self {
        Self(context)
    }

    /// Get the context as JSON.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume and return the inner JSON.
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for RouteMatch {
    fn from(context: Value) -> Self {
        Self(context)
    }
}

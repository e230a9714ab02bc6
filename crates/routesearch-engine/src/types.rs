//! Request and result types exchanged with the search engine.

use std::collections::HashMap;

use routesearch_core::{Pagination, PaginationDetails};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A single search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub index: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    /// Parsed query body.
    pub body: Value,
}

impl SearchRequest {
    /// The multi-search header line for this request.
    pub fn head(&self) -> Value {
        match &self.doc_type {
            Some(doc_type) => json!({"index": self.index, "type": doc_type}),
            None => json!({"index": self.index}),
        }
    }
}

/// A batch of searches sent in one round trip.
///
/// Entries keep the order they were pushed in; responses come back in the
/// same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiSearchRequest {
    requests: Vec<SearchRequest>,
}

impl MultiSearchRequest {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search to the batch.
    pub fn push(&mut self, request: SearchRequest) {
        self.requests.push(request);
    }

    /// Searches in the batch, in order.
    pub fn requests(&self) -> &[SearchRequest] {
        &self.requests
    }

    /// Number of searches in the batch.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Alternating header/body lines, as the bulk API expects them.
    pub fn bulk_body(&self) -> Vec<Value> {
        self.requests
            .iter()
            .flat_map(|request| [request.head(), request.body.clone()])
            .collect()
    }
}

/// Raw reply to a multi-search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSearchResponse {
    /// One response per request, in request order.
    #[serde(default)]
    pub responses: Option<Vec<Value>>,
}

/// Extract the total hit count from a raw search response.
///
/// Understands both `hits.total: N` and `hits.total: {"value": N}`.
pub fn total_hits(response: &Value) -> Option<u64> {
    response.get("hits").and_then(hits_total)
}

fn hits_total(hits: &Value) -> Option<u64> {
    let total = hits.get("total")?;
    total
        .as_u64()
        .or_else(|| total.get("value").and_then(Value::as_u64))
}

/// A raw engine response annotated with pagination and the request sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// The engine's response, as returned.
    #[serde(flatten)]
    pub response: Map<String, Value>,

    pub pagination: Pagination,

    /// The request that produced this response.
    pub request: SearchRequest,
}

impl SearchResult {
    /// Build a result, computing pagination from the applied offset/size.
    pub(crate) fn new(response: Value, applied: PaginationDetails, request: SearchRequest) -> Self {
        let total = total_hits(&response).unwrap_or(0);
        let pagination =
            routesearch_core::compute_pagination(applied.from, applied.size, total);
        let response = match response {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("response".to_string(), other);
                map
            }
        };
        Self {
            response,
            pagination,
            request,
        }
    }

    /// Total hit count reported by the engine.
    pub fn total_hits(&self) -> Option<u64> {
        self.response.get("hits").and_then(hits_total)
    }

    /// The hit documents, if the response carries any.
    pub fn hits(&self) -> &[Value] {
        self.response
            .get("hits")
            .and_then(|hits| hits.get("hits"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The offset/size the query was executed with.
    pub fn applied(&self) -> PaginationDetails {
        self.pagination.details()
    }
}

/// Batch results keyed by template name.
pub type SearchResultMap = HashMap<String, SearchResult>;

/// Output of a search task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskOutput {
    Single(SearchResult),
    Batch(SearchResultMap),
}

impl TaskOutput {
    /// The single result, if this was a single query.
    pub fn into_single(self) -> Option<SearchResult> {
        match self {
            Self::Single(result) => Some(result),
            Self::Batch(_) => None,
        }
    }

    /// The result map, if this was a batch.
    pub fn into_batch(self) -> Option<SearchResultMap> {
        match self {
            Self::Batch(results) => Some(results),
            Self::Single(_) => None,
        }
    }
}

//! Pagination metadata for search results.
//!
//! Pagination is derived from the `from`/`size` a query was sent with and
//! the total hit count the engine reported. It is computed once per result
//! and never changes afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Offset used when a query does not specify `from`.
pub const DEFAULT_FROM: u64 = 0;

/// Page size used when a query does not specify `size`.
pub const DEFAULT_SIZE: u64 = 10;

/// Number of page numbers in the window around the current page.
const WINDOW_WIDTH: i128 = 9;

/// Offset/size pair a query was executed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationDetails {
    pub from: u64,
    pub size: u64,
}

impl Default for PaginationDetails {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM,
            size: DEFAULT_SIZE,
        }
    }
}

impl PaginationDetails {
    /// Read `from`/`size` out of a rendered query body.
    ///
    /// Missing, non-numeric or negative values fall back to the defaults. A
    /// `size` of 0 also falls back, so the result is always safe to pass to
    /// [`compute_pagination`].
    pub fn from_query(body: &Value) -> Self {
        let from = body
            .get("from")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_FROM);
        let size = body
            .get("size")
            .and_then(Value::as_u64)
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_SIZE);
        Self { from, size }
    }
}

/// A page number near the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub page_number: u64,

    /// Number of pages between this entry and the current page.
    pub distance: u64,
}

/// Pagination metadata attached to a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub from: u64,
    pub size: u64,
    pub total_results: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub next_page: Option<u64>,
    pub prev_page: Option<u64>,
    pub page_range: Vec<PageEntry>,
}

impl Pagination {
    /// The offset/size this pagination was computed from.
    pub fn details(&self) -> PaginationDetails {
        PaginationDetails {
            from: self.from,
            size: self.size,
        }
    }
}

/// Compute pagination metadata for a result set.
///
/// The page window holds up to nine page numbers centred on the current
/// page, shifted so it never starts below page 1 or ends past the last page,
/// then clipped to `[1, total_pages]`.
///
/// Any `from`/`total_results` is accepted. The current page saturates at
/// `u64::MAX`, which can only happen with a page size of 1.
///
/// # Panics
///
/// Panics if `size` is 0. Callers must pass a page size of at least 1.
pub fn compute_pagination(from: u64, size: u64, total_results: u64) -> Pagination {
    let total_pages = total_results.div_ceil(size);
    let current_page = (from / size).saturating_add(1);

    let next_page = (current_page < total_pages).then(|| current_page + 1);
    let prev_page = (current_page > 1).then(|| current_page - 1);

    // Widened so the window can extend past either end of the u64 range.
    let current = i128::from(current_page);
    let last = i128::from(total_pages);

    let mut start = current - (WINDOW_WIDTH - 1) / 2;
    if start < 1 {
        start = 1;
    }
    let mut end = start + WINDOW_WIDTH - 1;
    if end > last {
        start -= end - last;
        end = last;
    }

    let page_range = (start.max(1)..=end)
        .filter_map(|page| u64::try_from(page).ok())
        .map(|page| PageEntry {
            page_number: page,
            distance: current_page.abs_diff(page),
        })
        .collect();

    Pagination {
        from,
        size,
        total_results,
        total_pages,
        current_page,
        next_page,
        prev_page,
        page_range,
    }
}

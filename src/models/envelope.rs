use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Default and maximum page sizes for list endpoints.
pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

/// ApiResponse
///
/// Success envelope returned by every JSON endpoint: `{ "success": true, "data": ... }`.
/// List endpoints additionally carry a `pagination` block.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn paginated(page: Page<T>, request: PageRequest) -> Self {
        let pagination = Pagination::new(page.total, request);
        Self {
            success: true,
            data: page.items,
            pagination: Some(pagination),
        }
    }
}

/// ErrorEnvelope
///
/// Failure body: `{ "success": false, "error": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, PartialEq)]
#[ts(export)]
pub struct Pagination {
    pub total_docs: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(total_docs: u64, request: PageRequest) -> Self {
        let total_pages = total_docs.div_ceil(request.limit);
        Self {
            total_docs,
            limit: request.limit,
            page: request.page,
            total_pages,
            has_next_page: request.page < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

/// PageRequest
///
/// A normalized `page`/`limit` pair. Pages are 1-based; the limit is clamped
/// to `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Number of records to skip before this page starts.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Page
///
/// One page of records plus the total number of matching records.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T: Clone> Page<T> {
    /// Slices an already filtered and sorted list (used by the in-memory repository).
    pub fn from_sorted(items: &[T], request: PageRequest) -> Self {
        let total = items.len() as u64;
        let start = usize::try_from(request.skip()).unwrap_or(usize::MAX).min(items.len());
        let end = usize::try_from(request.limit)
            .map(|limit| start.saturating_add(limit))
            .unwrap_or(usize::MAX)
            .min(items.len());
        Self {
            items: items[start..end].to_vec(),
            total,
        }
    }
}

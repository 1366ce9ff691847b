//! Pagination contract shared by every list endpoint: raw `page`/`limit`
//! query strings are normalized into valid bounds, and responses carry a
//! `{ data, pagination }` envelope with stable metadata.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 6;
pub const MAX_LIMIT: i64 = 100;

/// Normalized page/limit pair. `page` is always >= 1 and `limit` always in
/// [1, 100]; there is no upper bound on `page` - a page past the end of the
/// data simply comes back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Parse raw query values. Absent or malformed input falls back to the
    /// defaults (page 1, 6 items); limits above 100 are clamped, not rejected.
    pub fn resolve(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = match page.and_then(|p| p.parse::<i64>().ok()) {
            Some(p) if p >= 1 => p,
            _ => DEFAULT_PAGE,
        };
        let limit = match limit.and_then(|l| l.parse::<i64>().ok()) {
            Some(l) if l >= 1 => l.min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Derived pagination metadata; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    #[serde(rename = "totalItems")]
    pub total_items: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
    pub limit: i64,
}

impl PaginationMeta {
    pub fn new(total_items: i64, params: PageParams) -> Self {
        let total_pages = if total_items > 0 {
            (total_items + params.limit - 1) / params.limit
        } else {
            0
        };
        Self {
            total_items,
            total_pages,
            current_page: params.page,
            limit: params.limit,
        }
    }
}

/// Wire envelope for paginated responses: `{ "data": [...], "pagination": {...} }`.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total_items: i64, params: PageParams) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(total_items, params),
        }
    }
}

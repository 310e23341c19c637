//! Pagination types shared by every list endpoint.

use serde::{Deserialize, Serialize};

/// Pagination parameters shared across all list endpoints.
///
/// - `limit`: 1–100, default 5
/// - `page`: ≥ 1 (1-indexed), default 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    5
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Clamp `limit` to the valid range 1–100 and `page` to ≥ 1.
    ///
    /// Call after deserializing from query params to enforce bounds.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, 100),
        }
    }

    /// Number of rows to skip for this page.
    pub fn offset(self) -> u64 {
        let p = self.clamped();
        (p.page as u64 - 1) * p.limit as u64
    }
}

/// `ceil(total_items / limit)`, never less than 1 so an empty listing still has one page.
pub fn total_pages(total_items: u64, limit: u32) -> u32 {
    let limit = limit.max(1) as u64;
    let pages = total_items.div_ceil(limit);
    pages.max(1).min(u32::MAX as u64) as u32
}

/// One page of results plus the metadata the dashboards paginate with.
///
/// A page past `total_pages` is not an error: it carries an empty `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let request = request.clamped();
        Self {
            data,
            page: request.page,
            limit: request.limit,
            total_items,
            total_pages: total_pages(total_items, request.limit),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

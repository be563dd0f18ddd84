//! Pagination requests and response metadata.

use serde::{Deserialize, Serialize};

use forge_core::defaults;

/// A validated pagination request (1-based page numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: defaults::PAGE_DEFAULT,
            limit: defaults::PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build from raw query parameters, clamping both values to >= 1.
    pub fn from_params(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(defaults::PAGE_DEFAULT).max(1),
            limit: limit.unwrap_or(defaults::PAGE_LIMIT).max(1),
        }
    }

    /// Number of records to skip before this page.
    pub fn skip(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Wrap a page of data with its pagination metadata.
    pub fn paginate<T>(&self, data: Vec<T>, total: i64) -> Paginated<T> {
        let total_pages = if total == 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        };
        Paginated {
            data,
            current_page: self.page,
            total_pages,
            total_data: total,
            next: (self.page < total_pages).then(|| PageRef {
                page: self.page + 1,
            }),
            previous: (self.page > 1).then(|| PageRef {
                page: self.page - 1,
            }),
        }
    }
}

/// Cursor to an adjacent page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub page: i64,
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_data: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageRef>,
}

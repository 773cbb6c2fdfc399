//! Pagination types for the user listing endpoint.
//!
//! The page size is fixed at [`PAGE_SIZE`]; clients choose only the page.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_PAGE_NUMBER, PAGE_SIZE};

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Create new paginated response over the fixed page size
    pub fn new(data: Vec<T>, page: u64, total: u64) -> Self {
        let total_pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;

        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page: PAGE_SIZE,
                total,
                total_pages,
            },
        }
    }
}

//! This modules defines the common functionality for paging data.

use serde::Serialize;

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl PaginationConfig {
    /// Resolve the requested page and page size against the defaults.
    ///
    /// Page numbers start at one. Zero values fall back to the defaults and
    /// page sizes are capped at [PaginationConfig::max_page_size].
    pub fn resolve(&self, page: Option<u64>, page_size: Option<u64>) -> Page {
        let number = page.filter(|&page| page > 0).unwrap_or(self.default_page);
        let size = page_size
            .filter(|&size| size > 0)
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size);

        Page { number, size }
    }
}

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The one-based page number.
    pub number: u64,
    /// The number of items per page.
    pub size: u64,
}

impl Page {
    /// The number of rows per page, as bound to a `LIMIT` clause.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the page size does not fit in an SQLite integer.
    pub fn limit(&self) -> Result<i64, Error> {
        i64::try_from(self.size).map_err(|_| page_out_of_range())
    }

    /// The number of rows to skip to reach this page, as bound to an `OFFSET` clause.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the offset does not fit in an SQLite integer.
    pub fn offset(&self) -> Result<i64, Error> {
        self.number
            .saturating_sub(1)
            .checked_mul(self.size)
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or_else(page_out_of_range)
    }
}

fn page_out_of_range() -> Error {
    Error::Validation("page is out of range".to_owned())
}

/// Describes where a page sits in the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// The one-based page number.
    pub page: u64,
    /// The number of items per page.
    pub limit: u64,
    /// The total number of items across all pages.
    pub total: u64,
    /// The number of pages needed to show all items.
    pub pages: u64,
}

impl PageInfo {
    /// Describe `page` within a result set of `total` items.
    pub fn new(page: Page, total: u64) -> Self {
        Self {
            page: page.number,
            limit: page.size,
            total,
            pages: total.div_ceil(page.size),
        }
    }
}

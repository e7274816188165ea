//! This module defines the common functionality for paging data.

use serde::Deserialize;

/// The config for pagination.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of rows per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// The pagination query parameters accepted by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationParams {
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The number of rows per page.
    pub limit: Option<u64>,
}

/// A page request resolved against the configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    pub number: u64,
    /// The number of rows per page. At least one.
    pub size: u64,
}

impl Page {
    /// Resolve raw query parameters against the configured defaults.
    ///
    /// Zeroes are bumped to one so an offset and page count can always be
    /// computed.
    pub fn resolve(params: PaginationParams, config: &PaginationConfig) -> Self {
        let number = params.page.unwrap_or(config.default_page).max(1);
        let size = params.limit.unwrap_or(config.default_page_size).max(1);

        Self { number, size }
    }

    /// The number of rows to skip to reach this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }

    /// The number of pages needed to show `total_rows` rows.
    pub fn total_page_count(&self, total_rows: u64) -> u64 {
        total_rows.div_ceil(self.size)
    }
}

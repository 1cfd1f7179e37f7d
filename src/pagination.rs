//! This modules defines the common functionality for paging and sorting data.

use serde::{Deserialize, Serialize};

/// The config for pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest number of items a client may request per page.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// SQLite integers are signed 64-bit.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// A page of items along with where the page sits in the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// The page number, starting from 1.
    pub current_page: u64,
    /// The maximum number of items on a page.
    pub per_page: u64,
    /// The number of items across all pages.
    pub total: u64,
    /// The number of the last page, at least 1.
    pub last_page: u64,
    /// The items on this page.
    pub data: Vec<T>,
}

/// A validated page number and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The page number, starting from 1.
    pub page: u64,
    /// The number of items per page.
    pub per_page: u64,
}

impl PageRequest {
    /// Resolve the requested page and page size against `config`.
    ///
    /// Missing values fall back to the first page and the default page size.
    /// Page numbers start from 1 and the page size is clamped to
    /// `1..=config.max_page_size`.
    pub fn new(page: Option<u64>, per_page: Option<u64>, config: &PaginationConfig) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(config.default_page_size)
                .clamp(1, config.max_page_size.max(1)),
        }
    }

    /// The number of items to skip to get to this page.
    ///
    /// The offset never exceeds the largest integer SQLite accepts, so pages
    /// far past the end are simply empty.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.per_page)
            .min(MAX_OFFSET)
    }

    /// Wrap the items for this page, given `total` items across all pages.
    pub fn into_page<T>(self, total: u64, data: Vec<T>) -> Page<T> {
        Page {
            current_page: self.page,
            per_page: self.per_page,
            total,
            last_page: total.div_ceil(self.per_page).max(1),
            data,
        }
    }
}

/// The order to list savings accounts and wishes in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    Newest,
    /// Least recently created first.
    Oldest,
    /// Largest amount first.
    Highest,
    /// Smallest amount first.
    Lowest,
}

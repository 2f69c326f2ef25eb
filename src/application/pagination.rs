//! Offset pagination: request validation, page windows and paged results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("invalid pagination parameters: page={page}, limit={limit}")]
    InvalidParameters { page: i64, limit: i64 },
    #[error("page {page} does not exist (total pages: {total_pages})")]
    PageNotFound { page: u32, total_pages: u64 },
}

/// A validated page/limit pair. Both values are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate raw query values. Anything below 1, or beyond `u32`, is rejected.
    pub fn new(page: i64, limit: i64) -> Result<Self, PaginationError> {
        let invalid = || PaginationError::InvalidParameters { page, limit };
        if page < 1 || limit < 1 {
            return Err(invalid());
        }
        Ok(Self {
            page: u32::try_from(page).map_err(|_| invalid())?,
            limit: u32::try_from(limit).map_err(|_| invalid())?,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Bounds of one page within a collection of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PageWindow {
    /// Number of rows preceding this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Whether the window can contain any item at all.
    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

/// Compute the page window for `request` over `total_items` rows.
///
/// An empty collection accepts every page and yields an empty window.
pub fn paginate(request: PageRequest, total_items: u64) -> Result<PageWindow, PaginationError> {
    let total_pages = total_items.div_ceil(u64::from(request.limit));
    if total_items > 0 && u64::from(request.page) > total_pages {
        return Err(PaginationError::PageNotFound {
            page: request.page,
            total_pages,
        });
    }

    Ok(PageWindow {
        page: request.page,
        limit: request.limit,
        total_items,
        total_pages,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_items: u64,
    pub total_pages: u64,
    pub page: u32,
    pub limit: u32,
}

impl From<PageWindow> for PaginationMeta {
    fn from(window: PageWindow) -> Self {
        Self {
            total_items: window.total_items,
            total_pages: window.total_pages,
            page: window.page,
            limit: window.limit,
        }
    }
}

/// One page of a collection plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            pagination: window.into(),
        }
    }

    pub fn empty(window: PageWindow) -> Self {
        Self::new(Vec::new(), window)
    }
}

//! Fixed-size pagination with silent fallback to page 1.
//!
//! Page numbers are 1-based. A requested page of 0 or one past the end of a
//! result set is served as page 1 rather than an error; repositories resolve
//! the page they will actually serve with [`PageRequest::clamp`] before
//! slicing.

use serde::Serialize;

/// Default listing page size.
pub const DEFAULT_PAGE_SIZE: u32 = 3;

/// A requested page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number as requested by the client.
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page: per_page.max(1),
        }
    }

    /// First page at the default size.
    pub fn first() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }

    /// Number of pages a result set of `total_items` occupies. An empty
    /// result set still presents as a single (empty) page.
    pub fn total_pages(&self, total_items: u64) -> u64 {
        if total_items == 0 {
            1
        } else {
            total_items.div_ceil(u64::from(self.per_page))
        }
    }

    /// The page that will actually be served: the requested one when it is
    /// in range, page 1 otherwise.
    pub fn clamp(&self, total_items: u64) -> u32 {
        if self.page == 0 || u64::from(self.page) > self.total_pages(total_items) {
            1
        } else {
            self.page
        }
    }

    /// Item offset of the served page.
    pub fn offset(&self, total_items: u64) -> u64 {
        u64::from(self.clamp(total_items) - 1) * u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One served page of results plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The page actually served (after clamping).
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from an already-sliced item vector.
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.clamp(total_items),
            per_page: request.per_page,
            total_items,
            total_pages: request.total_pages(total_items),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

//! Pagination helper types for repository queries

use serde::{Deserialize, Serialize};

/// Largest page a caller may request; bigger sizes are clamped.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Pagination request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Current page number (0-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request, clamping `page_size` to [`MAX_PAGE_SIZE`]
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(2, 20);
    /// assert_eq!(request.offset(), 40);
    /// assert_eq!(PageRequest::new(0, 10_000).page_size, 500);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        }
    }

    /// SQL `OFFSET` for this page
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.page_size)
    }

    /// SQL `LIMIT` for this page
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size.min(MAX_PAGE_SIZE))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 50,
        }
    }
}

/// One page of results plus totals across all pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let total_pages = if request.page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(request.page_size)) as u32
        };

        Self {
            items,
            total,
            page: request.page,
            total_pages,
            page_size: request.page_size,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            total_pages: self.total_pages,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_size() {
        let request = PageRequest::new(0, MAX_PAGE_SIZE + 1);
        assert_eq!(request.page_size, MAX_PAGE_SIZE);
        assert_eq!(request.limit(), i64::from(MAX_PAGE_SIZE));
    }

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 75);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = Page::new(vec!["a", "b"], 5, PageRequest::new(1, 3));
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next());

        let page = Page::new(vec!["a"], 5, PageRequest::new(0, 3));
        assert!(page.has_next());
    }

    #[test]
    fn test_has_next_on_last_representable_page() {
        let page: Page<u8> = Page::new(vec![], 10, PageRequest::new(u32::MAX, 5));
        assert!(!page.has_next());
    }

    #[test]
    fn test_zero_page_size() {
        let page: Page<u8> = Page::new(vec![], 25, PageRequest::new(0, 0));
        assert_eq!(page.total_pages, 0);
        assert!(page.is_empty());
    }

    #[test]
    fn test_page_map_keeps_totals() {
        let page = Page::new(vec![1, 2], 12, PageRequest::new(0, 2)).map(|x| x * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages, 6);
    }
}

use serde::Serialize;

// ============================================================================
// Paging Primitives
// ============================================================================
//
// Pages are 1-based. The unfiltered orders listing and the line-items listing
// use DEFAULT_PAGE_SIZE; a filtered search sets page_size to the full match
// count, so every match lands on page 1 (behavior carried over from the
// original listing).
//
// ============================================================================

pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Serialize, Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, page_size: i64, total_items: i64) -> Self {
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages: page_count(total_items, page_size),
        }
    }
}

/// Clamp a client-supplied page number to 1-based.
pub fn normalize_page(page: i64) -> i64 {
    page.max(1)
}

/// Row offset for a 1-based page.
pub fn offset(page: i64, page_size: i64) -> i64 {
    (normalize_page(page) - 1) * page_size
}

/// Number of pages needed to hold `total_items` rows, ceiling division.
pub fn page_count(total_items: i64, page_size: i64) -> i64 {
    if total_items <= 0 {
        return 0;
    }
    if page_size <= 0 {
        return 1;
    }
    (total_items + page_size - 1) / page_size
}

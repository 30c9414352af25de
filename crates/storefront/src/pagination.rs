//! Page slicing for product listings.

use serde::Serialize;

/// Default number of products per page.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub current_page: usize,
    /// Zero when the list is empty.
    pub total_pages: usize,
}

/// Slice `items` into page `page` of `page_size`.
///
/// The requested page is clamped into `1..=total_pages` (or 1 for an empty
/// list). A `page_size` of zero is treated as one.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size);
    let current_page = page.clamp(1, total_pages.max(1));

    let start = (current_page - 1) * page_size;
    let items = items
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Page {
        items,
        current_page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list() {
        let page = paginate::<u32>(&[], 3, 12);
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_partial_last_page() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(&items, 3, 12);
        assert_eq!(page.items, vec![25]);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let items: Vec<u32> = (1..=5).collect();
        assert_eq!(paginate(&items, 9, 2).current_page, 3);
        assert_eq!(paginate(&items, 0, 2).items, vec![1, 2]);
    }

    #[test]
    fn test_zero_page_size_treated_as_one() {
        let page = paginate(&[10, 20], 2, 0);
        assert_eq!(page.items, vec![20]);
        assert_eq!(page.total_pages, 2);
    }
}

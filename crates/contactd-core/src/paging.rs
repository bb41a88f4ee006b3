// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Over-fetch-by-one pagination.
//!
//! Stores fetch `size + 1` rows at `(page - 1) * size`; the extra row only
//! signals that another page exists and is never returned to the caller.

use serde::{Deserialize, Serialize};

/// A coerced page request. `page` and `size` are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingWindow {
    page: i64,
    size: i64,
}

impl PagingWindow {
    /// Builds a window, coercing a page or size below 1 to 1.
    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    /// Number of rows the store must fetch.
    pub fn fetch_limit(&self) -> i64 {
        self.size.saturating_add(1)
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Truncates an over-fetched row set to the page size and flags whether
    /// more rows exist.
    pub fn split<T>(&self, mut rows: Vec<T>) -> Page<T> {
        let size = usize::try_from(self.size).unwrap_or(usize::MAX);
        let has_next = rows.len() > size;
        if has_next {
            rows.truncate(size);
        }
        Page {
            items: rows,
            page: self.page,
            size: self.size,
            has_next,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_page_starts_at_zero() {
        let window = PagingWindow::new(1, 10);
        assert_eq!(window.offset(), 0);
        assert_eq!(window.fetch_limit(), 11);
    }

    #[test]
    fn third_page_skips_two_pages() {
        let window = PagingWindow::new(3, 25);
        assert_eq!(window.offset(), 50);
    }

    #[test]
    fn exactly_size_plus_one_rows_flags_next_page() {
        let window = PagingWindow::new(1, 3);
        let page = window.split(vec![1, 2, 3, 4]);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert!(page.has_next);
    }

    #[test]
    fn exactly_size_rows_has_no_next_page() {
        let window = PagingWindow::new(1, 3);
        let page = window.split(vec![1, 2, 3]);
        assert_eq!(page.len(), 3);
        assert!(!page.has_next);
    }

    #[test]
    fn empty_result_is_a_valid_page() {
        let page = PagingWindow::new(5, 10).split(Vec::<u8>::new());
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert_eq!(page.page, 5);
    }

    #[test]
    fn huge_values_saturate_instead_of_overflowing() {
        let window = PagingWindow::new(i64::MAX, i64::MAX);
        assert_eq!(window.fetch_limit(), i64::MAX);
        assert_eq!(window.offset(), i64::MAX);
    }

    proptest! {
        #[test]
        fn non_positive_inputs_coerce_to_one(page in i64::MIN..1, size in i64::MIN..1) {
            let window = PagingWindow::new(page, size);
            prop_assert_eq!(window.page(), 1);
            prop_assert_eq!(window.size(), 1);
            prop_assert_eq!(window.offset(), 0);
            prop_assert_eq!(window.fetch_limit(), 2);
        }

        #[test]
        fn split_never_returns_more_than_size(size in 1i64..50, rows in 0usize..120) {
            let window = PagingWindow::new(1, size);
            let page = window.split((0..rows).collect::<Vec<_>>());
            prop_assert!(page.len() as i64 <= size);
            prop_assert_eq!(page.has_next, rows as i64 > size);
        }
    }
}

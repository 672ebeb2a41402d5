// ── Pagination state machine ──
//
// Tracks the current page, the page size and the server-reported totals.
// Navigation is never an error: out-of-range targets are ignored.

use serde::{Deserialize, Serialize};

use crate::model::PagedResult;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Snapshot of the pagination fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub index: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: usize,
}

/// A page change emitted by a paginator widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEvent {
    pub page_index: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PaginationState {
    page: PageDescriptor,
}

impl PaginationState {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Start at page 0 with the given size. A zero size falls back to the default.
    pub fn with_page_size(size: usize) -> Self {
        Self {
            page: PageDescriptor {
                index: 0,
                size: if size == 0 { DEFAULT_PAGE_SIZE } else { size },
                total_elements: 0,
                total_pages: 0,
            },
        }
    }

    pub fn descriptor(&self) -> PageDescriptor {
        self.page
    }

    pub fn current_page(&self) -> usize {
        self.page.index
    }

    pub fn page_size(&self) -> usize {
        self.page.size
    }

    pub fn total_elements(&self) -> u64 {
        self.page.total_elements
    }

    pub fn total_pages(&self) -> usize {
        self.page.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page.index > 0
    }

    pub fn has_next_page(&self) -> bool {
        self.page.index.saturating_add(1) < self.page.total_pages
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Move to `page` if it is within `0..total_pages`.
    pub fn go_to_page(&mut self, page: usize) {
        if page < self.page.total_pages {
            self.page.index = page;
        }
    }

    pub fn next_page(&mut self) {
        if self.has_next_page() {
            self.go_to_page(self.page.index.saturating_add(1));
        }
    }

    pub fn previous_page(&mut self) {
        if self.has_previous_page() {
            self.go_to_page(self.page.index - 1);
        }
    }

    /// Set the page size and return to the first page. Zero is ignored.
    pub fn change_page_size(&mut self, size: usize) {
        if size == 0 {
            return;
        }
        self.page.size = size;
        self.reset();
    }

    /// Back to page 0; size untouched.
    pub fn reset(&mut self) {
        self.page.index = 0;
    }

    /// A size change wins over navigation: the requested index is
    /// dropped and the state returns to page 0.
    pub fn handle_user_page_event(&mut self, event: PageEvent) {
        if event.page_size == self.page.size {
            self.go_to_page(event.page_index);
        } else {
            self.change_page_size(event.page_size);
        }
    }

    // ── Sync from server ─────────────────────────────────────────────

    /// Overwrite totals and index with the server's authoritative values.
    pub fn update_from_server(&mut self, result: &PagedResult) {
        self.page.total_elements = result.total_elements;
        self.page.total_pages = result.total_pages;
        self.page.index = result.page_index;
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_pages(total_pages: usize, index: usize) -> PaginationState {
        let mut state = PaginationState::new();
        let result = PagedResult::new(Vec::new(), 0, total_pages, index, DEFAULT_PAGE_SIZE);
        state.update_from_server(&result);
        state
    }

    #[test]
    fn initial_state() {
        let state = PaginationState::new();
        assert_eq!(
            state.descriptor(),
            PageDescriptor {
                index: 0,
                size: 25,
                total_elements: 0,
                total_pages: 0
            }
        );
        assert!(!state.has_next_page());
        assert!(!state.has_previous_page());
    }

    #[test]
    fn go_to_page_ignores_out_of_range() {
        let mut state = with_pages(3, 0);
        state.go_to_page(2);
        assert_eq!(state.current_page(), 2);

        state.go_to_page(3);
        assert_eq!(state.current_page(), 2);

        let mut empty = PaginationState::new();
        empty.go_to_page(0);
        assert_eq!(empty.current_page(), 0);
        empty.go_to_page(1);
        assert_eq!(empty.current_page(), 0);
    }

    #[test]
    fn next_and_previous_respect_bounds() {
        let mut state = with_pages(2, 0);
        state.previous_page();
        assert_eq!(state.current_page(), 0);

        state.next_page();
        assert_eq!(state.current_page(), 1);
        assert!(!state.has_next_page());

        state.next_page();
        assert_eq!(state.current_page(), 1);

        state.previous_page();
        assert_eq!(state.current_page(), 0);
    }

    #[test]
    fn change_page_size_resets_index() {
        let mut state = with_pages(10, 7);
        state.change_page_size(50);
        assert_eq!(state.page_size(), 50);
        assert_eq!(state.current_page(), 0);

        state.change_page_size(0);
        assert_eq!(state.page_size(), 50);
    }

    #[test]
    fn reset_keeps_size() {
        let mut state = with_pages(10, 4);
        state.change_page_size(10);
        state.go_to_page(4);
        state.reset();
        assert_eq!(state.current_page(), 0);
        assert_eq!(state.page_size(), 10);
    }

    #[test]
    fn page_event_with_same_size_navigates() {
        let mut state = with_pages(4, 0);
        state.handle_user_page_event(PageEvent {
            page_index: 1,
            page_size: 25,
        });
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn page_event_with_new_size_discards_index() {
        let mut state = with_pages(4, 1);
        state.handle_user_page_event(PageEvent {
            page_index: 2,
            page_size: 50,
        });
        assert_eq!(state.page_size(), 50);
        assert_eq!(state.current_page(), 0);
    }

    #[test]
    fn server_update_overwrites_index() {
        let mut state = with_pages(5, 3);
        let result = PagedResult::new(Vec::new(), 30, 2, 1, 25);
        state.update_from_server(&result);
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.total_pages(), 2);
        assert_eq!(state.total_elements(), 30);
    }

    #[test]
    fn server_index_at_usize_max_is_last_page() {
        let mut state = PaginationState::new();
        let result = PagedResult::new(Vec::new(), 10, usize::MAX, usize::MAX, 25);
        state.update_from_server(&result);
        assert!(!state.has_next_page());
        assert!(state.has_previous_page());

        state.next_page();
        assert_eq!(state.current_page(), usize::MAX);
    }
}

// ── Observable aggregation state ──
//
// The one snapshot the view reads. Owned fields are mutated only by the
// controller; everything else is derived on read, so derived values can
// never lag behind their inputs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    AggregatedRecord, Column, DEFAULT_COLUMNS, GroupField, GroupingSelection, PagedResult,
    SortOrder,
};
use crate::pagination::PaginationState;

/// A unit of work for the load pipeline, captured when the reload was
/// requested. The page size is read later, at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Monotonic request number; the pipeline commits it on completion.
    pub seq: u64,
    pub grouping: GroupingSelection,
    pub page_index: usize,
    pub sort: Option<SortOrder>,
    /// Skip the cache read (the fresh result is still cached).
    pub bypass_cache: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationState {
    selected_fields: GroupingSelection,
    sort: Option<SortOrder>,
    pagination: PaginationState,
    data: Arc<Vec<AggregatedRecord>>,
    loading: bool,
    error: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
    cache_key: Option<String>,
    served_from_cache: bool,
    #[serde(skip)]
    requested_seq: u64,
    #[serde(skip)]
    committed_seq: u64,
}

impl AggregationState {
    pub(crate) fn new(page_size: usize) -> Self {
        Self {
            selected_fields: GroupingSelection::new(),
            sort: None,
            pagination: PaginationState::with_page_size(page_size),
            data: Arc::new(Vec::new()),
            loading: false,
            error: None,
            loaded_at: None,
            cache_key: None,
            served_from_cache: false,
            requested_seq: 0,
            committed_seq: 0,
        }
    }

    // ── Owned state ──────────────────────────────────────────────────

    pub fn selected_fields(&self) -> &GroupingSelection {
        &self.selected_fields
    }

    pub fn sort(&self) -> Option<SortOrder> {
        self.sort
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn data(&self) -> &Arc<Vec<AggregatedRecord>> {
        &self.data
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// When the visible data was last committed successfully.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Composite cache key of the last committed load.
    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }

    /// Whether the last committed load was answered from the cache.
    pub fn served_from_cache(&self) -> bool {
        self.served_from_cache
    }

    // ── Derived ──────────────────────────────────────────────────────

    /// Default column set when ungrouped; otherwise the selection in
    /// order, then hours.
    pub fn displayed_columns(&self) -> Vec<Column> {
        if self.selected_fields.is_empty() {
            return DEFAULT_COLUMNS.to_vec();
        }
        self.selected_fields
            .iter()
            .map(Column::from)
            .chain(std::iter::once(Column::Hours))
            .collect()
    }

    pub fn is_field_selected(&self, field: GroupField) -> bool {
        self.selected_fields.contains(field)
    }

    pub fn has_data(&self) -> bool {
        !self.loading && self.error.is_none() && !self.data.is_empty()
    }

    pub fn show_no_data(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_empty()
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page()
    }

    pub fn page_size(&self) -> usize {
        self.pagination.page_size()
    }

    pub fn total_elements(&self) -> u64 {
        self.pagination.total_elements()
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.has_next_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.pagination.has_previous_page()
    }

    /// The latest requested load has been committed.
    pub fn is_settled(&self) -> bool {
        self.committed_seq == self.requested_seq && !self.loading
    }

    /// Number of reloads requested so far.
    pub fn requested(&self) -> u64 {
        self.requested_seq
    }

    // ── Mutation (controller only) ───────────────────────────────────

    pub(crate) fn selected_fields_mut(&mut self) -> &mut GroupingSelection {
        &mut self.selected_fields
    }

    pub(crate) fn pagination_mut(&mut self) -> &mut PaginationState {
        &mut self.pagination
    }

    pub(crate) fn set_sort(&mut self, sort: Option<SortOrder>) {
        self.sort = sort;
    }

    /// Allocate the next request from the current selection and page.
    pub(crate) fn next_request(&mut self, bypass_cache: bool) -> LoadRequest {
        self.requested_seq += 1;
        LoadRequest {
            seq: self.requested_seq,
            grouping: self.selected_fields.clone(),
            page_index: self.pagination.current_page(),
            sort: self.sort,
            bypass_cache,
        }
    }

    pub(crate) fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Applies a finished load. Returns `false` and leaves the state untouched
    /// when a newer request was issued after `seq`.
    pub(crate) fn commit_success(
        &mut self,
        seq: u64,
        key: String,
        from_cache: bool,
        result: &PagedResult,
    ) -> bool {
        if seq != self.requested_seq {
            return false;
        }
        self.data = Arc::clone(&result.content);
        self.pagination.update_from_server(result);
        self.loading = false;
        self.error = None;
        self.loaded_at = Some(Utc::now());
        self.cache_key = Some(key);
        self.served_from_cache = from_cache;
        self.committed_seq = seq;
        true
    }

    /// Stale rows never stay visible next to an error.
    pub(crate) fn commit_error(&mut self, seq: u64, key: String, message: String) -> bool {
        if seq != self.requested_seq {
            return false;
        }
        self.error = Some(message);
        self.loading = false;
        self.data = Arc::new(Vec::new());
        self.cache_key = Some(key);
        self.served_from_cache = false;
        self.committed_seq = seq;
        true
    }
}

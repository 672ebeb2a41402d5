use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Column;

/// One aggregated row. Dimensions outside the active grouping are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub hours: f64,
}

impl AggregatedRecord {
    /// Identity of the row within a page.
    pub fn row_key(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        (
            self.project.as_deref(),
            self.employee.as_deref(),
            self.date.as_deref(),
        )
    }

    /// Cell text for a display column.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Project => self.project.clone().unwrap_or_default(),
            Column::Employee => self.employee.clone().unwrap_or_default(),
            Column::Date => self.date.clone().unwrap_or_default(),
            Column::Hours => self.hours.to_string(),
        }
    }
}

/// A page of records plus flattened pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult {
    pub content: Arc<Vec<AggregatedRecord>>,
    pub total_elements: u64,
    pub total_pages: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub is_empty: bool,
}

impl PagedResult {
    /// Build a result, deriving the first/last/empty flags.
    pub fn new(
        content: Vec<AggregatedRecord>,
        total_elements: u64,
        total_pages: usize,
        page_index: usize,
        page_size: usize,
    ) -> Self {
        let is_empty = content.is_empty();
        Self {
            content: Arc::new(content),
            total_elements,
            total_pages,
            page_index,
            page_size,
            is_first: page_index == 0,
            // `>= total_pages - 1` without underflowing when there are no pages.
            is_last: page_index.saturating_add(1) >= total_pages,
            is_empty,
        }
    }
}

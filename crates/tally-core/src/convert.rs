// ── API-to-domain type conversions ──
//
// Bridges wire DTOs from tally-api into the canonical domain types.

use tally_api::{AggregatePage, AggregatedRecordDto};

use crate::model::{AggregatedRecord, PagedResult};

impl From<AggregatedRecordDto> for AggregatedRecord {
    fn from(dto: AggregatedRecordDto) -> Self {
        Self {
            project: dto.project,
            employee: dto.employee,
            date: dto.date,
            hours: dto.hours,
        }
    }
}

/// Flattens the nested `page` metadata and derives the boundary flags.
impl From<AggregatePage> for PagedResult {
    fn from(page: AggregatePage) -> Self {
        let meta = page.page;
        PagedResult::new(
            page.content.into_iter().map(AggregatedRecord::from).collect(),
            meta.total_elements,
            meta.total_pages,
            meta.number,
            meta.size,
        )
    }
}

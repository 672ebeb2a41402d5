// ── Domain model ──
//
// Canonical types for grouping, display columns and paged results.
// These are what consumers see; wire DTOs stay in tally-api.

mod field;
mod grouping;
mod record;

pub use field::{Column, DEFAULT_COLUMNS, GroupField, SortDirection, SortOrder};
pub use grouping::GroupingSelection;
pub use record::{AggregatedRecord, PagedResult};

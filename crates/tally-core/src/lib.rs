// tally-core: Reactive state core between tally-api and view consumers (CLI).

pub mod cache;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod gateway;
pub mod model;
pub mod pagination;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::TimeBasedCache;
pub use config::{AggregationConfig, RetryPolicy, TlsVerification};
pub use controller::{AggregationController, LOADING_ERROR_PREFIX};
pub use error::CoreError;
pub use gateway::{AggregateTransport, AggregationGateway};
pub use pagination::{PageDescriptor, PageEvent, PaginationState};
pub use state::{AggregationState, LoadRequest};

pub use model::{
    AggregatedRecord, Column, DEFAULT_COLUMNS, GroupField, GroupingSelection, PagedResult,
    SortDirection, SortOrder,
};

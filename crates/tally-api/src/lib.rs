// tally-api: Async Rust client for the activity aggregate endpoint

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{AggregateClient, AggregateQuery};
pub use error::Error;
pub use models::{AggregatePage, AggregatedRecordDto, PageMeta};
pub use transport::{TlsMode, TransportConfig};

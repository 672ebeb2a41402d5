// ── Aggregation gateway ──
//
// Wraps the transport call: builds the query, retries a bounded number
// of times with a fixed delay, and flattens the wire page into a
// `PagedResult`.

use std::future::Future;

use tally_api::{AggregateClient, AggregatePage, AggregateQuery};
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::CoreError;
use crate::model::{GroupingSelection, PagedResult, SortOrder};

/// One HTTP round trip to the aggregate endpoint.
///
/// Implemented by [`AggregateClient`]; tests substitute in-process fakes.
pub trait AggregateTransport: Send + Sync + 'static {
    fn fetch(
        &self,
        query: &AggregateQuery,
    ) -> impl Future<Output = Result<AggregatePage, tally_api::Error>> + Send;
}

impl AggregateTransport for AggregateClient {
    fn fetch(
        &self,
        query: &AggregateQuery,
    ) -> impl Future<Output = Result<AggregatePage, tally_api::Error>> + Send {
        self.fetch_aggregate(query)
    }
}

pub struct AggregationGateway<T> {
    transport: T,
    retry: RetryPolicy,
}

impl<T: AggregateTransport> AggregationGateway<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch one page for `grouping` (sent in selection order).
    ///
    /// Makes at most `1 + max_retries` attempts. Dropping the returned
    /// future abandons the request, including any pending retry delay.
    pub async fn fetch_page(
        &self,
        grouping: &GroupingSelection,
        page_index: usize,
        page_size: usize,
        sort: Option<&SortOrder>,
    ) -> Result<PagedResult, CoreError> {
        let query = AggregateQuery {
            page: page_index,
            size: page_size,
            group_by: grouping.query_values(),
            sort: sort.map(ToString::to_string),
        };

        let mut attempt: u32 = 0;
        loop {
            match self.transport.fetch(&query).await {
                Ok(page) => {
                    debug!(
                        attempt,
                        records = page.content.len(),
                        total_pages = page.page.total_pages,
                        "aggregate page fetched"
                    );
                    return Ok(PagedResult::from(page));
                }
                Err(e) => {
                    if attempt >= self.retry.max_retries {
                        debug!(error = %e, attempt, "aggregate fetch failed, giving up");
                        return Err(CoreError::from(e));
                    }
                    warn!(
                        error = %e,
                        attempt,
                        transient = e.is_transient(),
                        "aggregate fetch failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry.delay).await;
                }
            }
        }
    }
}

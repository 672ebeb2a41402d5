// ── Aggregation controller ──
//
// Owns the grouping selection and the committed data/loading/error state,
// and drives the load pipeline: debounce → cache → gateway → commit.
// Intent methods never fail; load failures surface as the `error` field.

use std::sync::Arc;
use std::time::Duration;

use tally_api::transport::{TlsMode, TransportConfig};
use tally_api::AggregateClient;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::{TimeBasedCache, page_key};
use crate::config::{AggregationConfig, TlsVerification};
use crate::error::CoreError;
use crate::gateway::{AggregateTransport, AggregationGateway};
use crate::model::{AggregatedRecord, Column, GroupField, GroupingSelection, PagedResult, SortOrder};
use crate::pagination::{PageEvent, PaginationState};
use crate::state::{AggregationState, LoadRequest};

/// Prefix of every load error shown to the user.
pub const LOADING_ERROR_PREFIX: &str = "Failed to load data";

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for view consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Construction spawns the
/// load pipeline on the current tokio runtime and requests the initial
/// ungrouped page 0. The pipeline stops on [`shutdown()`](Self::shutdown)
/// or when the last handle is dropped.
#[derive(Clone)]
pub struct AggregationController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    state: Arc<watch::Sender<AggregationState>>,
    requests: watch::Sender<Option<LoadRequest>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl AggregationController {
    /// Build the HTTP client from `config` and start the pipeline.
    pub fn from_config(config: &AggregationConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&config.tls),
            timeout: config.timeout,
        };
        let client = AggregateClient::new(&config.base_url, &transport)?;
        Ok(Self::start(
            AggregationGateway::new(client, config.retry),
            config,
        ))
    }

    /// Start the pipeline over an existing gateway.
    ///
    /// Uses `page_size`, `debounce` and `cache_ttl` from `config`; the
    /// gateway already carries its own retry policy.
    pub fn start<T: AggregateTransport>(
        gateway: AggregationGateway<T>,
        config: &AggregationConfig,
    ) -> Self {
        let (state, _) = watch::channel(AggregationState::new(config.page_size));
        let state = Arc::new(state);
        let (requests, requests_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let pipeline = Pipeline {
            gateway,
            cache: TimeBasedCache::new(config.cache_ttl),
            state: Arc::clone(&state),
        };
        let handle = tokio::spawn(pipeline_task(
            pipeline,
            requests_rx,
            config.debounce,
            cancel.clone(),
        ));

        let controller = Self {
            inner: Arc::new(ControllerInner {
                state,
                requests,
                cancel,
                task: Mutex::new(Some(handle)),
            }),
        };
        info!(page_size = config.page_size, "aggregation controller started");
        controller.enqueue(false, |_| {});
        controller
    }

    /// Stop the pipeline and wait for it to exit. An in-flight load is
    /// abandoned without committing.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!("aggregation controller stopped");
    }

    // ── User intents ─────────────────────────────────────────────

    /// Flip `field` in the selection, return to page 0 and reload.
    pub fn toggle_field(&self, field: GroupField) {
        self.enqueue(false, |state| {
            let selected = state.selected_fields_mut().toggle(field);
            state.pagination_mut().reset();
            debug!(%field, selected, "grouping toggled");
        });
    }

    /// Apply a paginator event (size change wins over navigation) and reload.
    pub fn handle_page_event(&self, event: PageEvent) {
        self.enqueue(false, |state| {
            state.pagination_mut().handle_user_page_event(event);
        });
    }

    /// Change the server-side sort, return to page 0 and reload.
    pub fn set_sort(&self, sort: Option<SortOrder>) {
        self.enqueue(false, |state| {
            state.set_sort(sort);
            state.pagination_mut().reset();
        });
    }

    /// Reload the current page from the server, skipping the cache read.
    pub fn refresh(&self) {
        self.enqueue(true, |_| {});
    }

    /// Advance one page; reloads only if the page moved.
    pub fn next_page(&self) {
        self.navigate(PaginationState::next_page);
    }

    /// Go back one page; reloads only if the page moved.
    pub fn previous_page(&self) {
        self.navigate(PaginationState::previous_page);
    }

    fn navigate(&self, step: fn(&mut PaginationState)) {
        self.enqueue_if(false, |state| {
            let before = state.current_page();
            step(state.pagination_mut());
            state.current_page() != before
        });
    }

    fn enqueue(&self, bypass_cache: bool, mutate: impl FnOnce(&mut AggregationState)) {
        self.enqueue_if(bypass_cache, |state| {
            mutate(state);
            true
        });
    }

    /// Mutate state and, when `mutate` asks for a reload, capture the load
    /// request in the same write. The request then replaces whatever sits
    /// in the pipeline's single slot.
    fn enqueue_if(
        &self,
        bypass_cache: bool,
        mutate: impl FnOnce(&mut AggregationState) -> bool,
    ) {
        let mut request = None;
        self.inner.state.send_if_modified(|state| {
            if !mutate(state) {
                return false;
            }
            request = Some(state.next_request(bypass_cache));
            true
        });
        let Some(request) = request else {
            return;
        };
        debug!(
            seq = request.seq,
            grouping = %request.grouping.cache_key(),
            page = request.page_index,
            "reload requested"
        );
        self.inner.requests.send_replace(Some(request));
    }

    // ── State observation ────────────────────────────────────────

    /// Current state snapshot.
    pub fn state(&self) -> AggregationState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AggregationState> {
        self.inner.state.subscribe()
    }

    /// State changes as a `Stream`, starting with the current snapshot.
    pub fn stream(&self) -> WatchStream<AggregationState> {
        WatchStream::new(self.inner.state.subscribe())
    }

    /// Wait until the most recently requested load has been committed.
    pub async fn settled(&self) -> Result<AggregationState, CoreError> {
        let mut rx = self.inner.state.subscribe();
        let cancel = self.inner.cancel.clone();
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::ControllerClosed),
            settled = rx.wait_for(AggregationState::is_settled) => settled
                .map(|state| state.clone())
                .map_err(|_| CoreError::ControllerClosed),
        }
    }

    // ── Snapshot accessors (delegate to state) ───────────────────

    pub fn data(&self) -> Arc<Vec<AggregatedRecord>> {
        Arc::clone(self.inner.state.borrow().data())
    }

    pub fn loading(&self) -> bool {
        self.inner.state.borrow().loading()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error().map(str::to_owned)
    }

    pub fn selected_fields(&self) -> GroupingSelection {
        self.inner.state.borrow().selected_fields().clone()
    }

    pub fn displayed_columns(&self) -> Vec<Column> {
        self.inner.state.borrow().displayed_columns()
    }

    pub fn is_field_selected(&self, field: GroupField) -> bool {
        self.inner.state.borrow().is_field_selected(field)
    }

    pub fn has_data(&self) -> bool {
        self.inner.state.borrow().has_data()
    }

    pub fn show_no_data(&self) -> bool {
        self.inner.state.borrow().show_no_data()
    }

    pub fn current_page(&self) -> usize {
        self.inner.state.borrow().current_page()
    }

    pub fn page_size(&self) -> usize {
        self.inner.state.borrow().page_size()
    }

    pub fn total_elements(&self) -> u64 {
        self.inner.state.borrow().total_elements()
    }

    pub fn total_pages(&self) -> usize {
        self.inner.state.borrow().total_pages()
    }

    pub fn has_next_page(&self) -> bool {
        self.inner.state.borrow().has_next_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.inner.state.borrow().has_previous_page()
    }
}

// ── Load pipeline ────────────────────────────────────────────────

struct Pipeline<T> {
    gateway: AggregationGateway<T>,
    cache: TimeBasedCache<PagedResult>,
    state: Arc<watch::Sender<AggregationState>>,
}

impl<T: AggregateTransport> Pipeline<T> {
    /// Process one request to completion and commit its outcome.
    async fn load(&mut self, request: LoadRequest) {
        self.state.send_modify(AggregationState::begin_load);

        let page_size = self.state.borrow().page_size();
        let key = page_key(
            &request.grouping,
            request.page_index,
            page_size,
            request.sort.as_ref(),
        );

        if !request.bypass_cache {
            if let Some(cached) = self.cache.get(&key) {
                debug!(seq = request.seq, %key, "cache hit");
                self.state.send_if_modified(|state| {
                    state.commit_success(request.seq, key, true, &cached)
                });
                return;
            }
        }

        let result = self
            .gateway
            .fetch_page(
                &request.grouping,
                request.page_index,
                page_size,
                request.sort.as_ref(),
            )
            .await;

        match result {
            Ok(page) => {
                let committed = self.state.send_if_modified(|state| {
                    state.commit_success(request.seq, key.clone(), false, &page)
                });
                if committed {
                    debug!(seq = request.seq, %key, records = page.content.len(), "load committed");
                    self.cache.set(key, page);
                } else {
                    debug!(seq = request.seq, %key, "superseded result discarded");
                }
            }
            Err(e) => {
                let message = format!("{LOADING_ERROR_PREFIX}: {}", e.user_message());
                debug!(seq = request.seq, %key, error = %e, "load failed");
                self.state
                    .send_if_modified(|state| state.commit_error(request.seq, key, message));
            }
        }
    }
}

/// Debounce the request slot, then run the latest request while watching
/// for a newer one. A newer request drops the in-flight load unfinished.
async fn pipeline_task<T: AggregateTransport>(
    mut pipeline: Pipeline<T>,
    mut requests: watch::Receiver<Option<LoadRequest>>,
    debounce: Duration,
    cancel: CancellationToken,
) {
    // Set when a request superseded the in-flight load; its change
    // notification was already consumed.
    let mut pending = false;

    loop {
        if !pending {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = requests.changed() => if changed.is_err() { break },
            }
        }

        // Quiet window, restarted by every new request.
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                changed = requests.changed() => if changed.is_err() { return },
                () = tokio::time::sleep(debounce) => break,
            }
        }

        let Some(request) = requests.borrow_and_update().clone() else {
            pending = false;
            continue;
        };
        let seq = request.seq;

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = requests.changed() => {
                if changed.is_err() {
                    break;
                }
                debug!(seq, "in-flight load superseded");
                pending = true;
            }
            () = pipeline.load(request) => pending = false,
        }
    }

    debug!("load pipeline exited");
}

// ── Helpers ──────────────────────────────────────────────────────

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

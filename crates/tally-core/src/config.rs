// ── Runtime configuration ──
//
// Describes where the aggregate endpoint lives and how the load pipeline
// is tuned. Never touches disk: tally-config builds one and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_TTL;
use crate::pagination::DEFAULT_PAGE_SIZE;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

/// Bounded retry for gateway calls: a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

/// Configuration for one aggregation controller.
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// API root, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    pub tls: TlsVerification,
    /// Per-request timeout. `None` = unbounded.
    pub timeout: Option<Duration>,
    /// Initial page size.
    pub page_size: usize,
    /// Quiet window before a burst of reload requests is processed.
    pub debounce: Duration,
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".into(),
            tls: TlsVerification::default(),
            timeout: None,
            page_size: DEFAULT_PAGE_SIZE,
            debounce: Duration::from_millis(150),
            cache_ttl: DEFAULT_TTL,
            retry: RetryPolicy::default(),
        }
    }
}

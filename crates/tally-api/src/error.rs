use thiserror::Error;

/// Top-level error type for the `tally-api` crate.
///
/// Every variant is a transport-level failure from the caller's point of
/// view. `tally-core` collapses them into a single user-facing kind.
#[derive(Debug, Error)]
pub enum Error {
    // ── HTTP status ─────────────────────────────────────────────────
    /// Non-2xx response. `message` is taken from the error body when the
    /// server sent one (`{"error":{"message"}}` wins over `{"message"}`).
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no error body"))]
    Api { status: u16, message: Option<String> },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Human-readable detail for display.
    ///
    /// Prefers the server-supplied message; otherwise falls back to the
    /// error's own description. `None` only when neither carries text.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Api { message, .. } => message.clone().filter(|m| !m.is_empty()),
            other => Some(other.to_string()).filter(|m| !m.is_empty()),
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

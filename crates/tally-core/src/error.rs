// ── Core error types ──
//
// User-facing errors from tally-core. Everything the transport layer can
// produce collapses into `Transport`; consumers never match on HTTP
// internals.

use thiserror::Error;

/// Fallback text when a failure carries no message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Error)]
pub enum CoreError {
    /// Non-success HTTP status or network failure, after retries.
    #[error("Transport error: {}", message.as_deref().unwrap_or(UNKNOWN_ERROR))]
    Transport {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The controller's pipeline has shut down.
    #[error("Aggregation controller closed")]
    ControllerClosed,
}

impl CoreError {
    /// Message for display next to the loading-error prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { message, .. } => message
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR.to_owned()),
            Self::Config { message } => message.clone(),
            Self::ControllerClosed => self.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tally_api::Error> for CoreError {
    fn from(err: tally_api::Error) -> Self {
        match err {
            tally_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tally_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            other => CoreError::Transport {
                status: other.status(),
                message: other.detail(),
            },
        }
    }
}

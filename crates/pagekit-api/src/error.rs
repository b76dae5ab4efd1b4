use thiserror::Error;

/// Top-level error type for the `pagekit-api` crate.
///
/// Covers every failure mode at the transport boundary: request
/// configuration, HTTP transport, server-reported failures, and reply
/// decoding. `pagekit-core` surfaces these to callers unchanged.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// The operation has no resolvable request template and the call
    /// supplied no explicit URL. Fails before any network activity.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status reported by the server.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Reply decoding failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Build a `Config` error for a missing request template.
    pub(crate) fn template_missing(operation: &str) -> Self {
        Self::Config {
            message: format!("{operation} request template missing"),
        }
    }

    /// The HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if this failure happened before any request was sent.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidUrl(_))
    }
}

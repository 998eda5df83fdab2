use thiserror::Error;

/// Unified error type for the pnl-monitor-core library.
///
/// Providers return these as typed failures; the services decide which of
/// them degrade to a fallback value and which reach the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Unexpected response from {provider}: {message}")]
    Parse {
        provider: String,
        message: String,
    },

    #[error("No provider configured for {0}")]
    NoProvider(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    /// True for failures where the upstream could not be reached or did not
    /// answer in time, as opposed to answering with something unusable.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, CoreError::Network(_) | CoreError::Timeout(_))
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; drop the query string
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        if e.is_timeout() {
            CoreError::Timeout(sanitized)
        } else {
            CoreError::Network(sanitized)
        }
    }
}

impl From<tokio::time::error::Elapsed> for CoreError {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        CoreError::Timeout(e.to_string())
    }
}
